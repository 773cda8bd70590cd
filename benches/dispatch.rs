use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use http::{HeaderMap, Method, StatusCode};
use reqdispatch::prelude::{Dispatcher, RequestOptions, Response, Transport, TransportError};
use serde_json::json;

struct NoopTransport;

impl Transport for NoopTransport {
    fn call(
        &self,
        _method: &Method,
        _url: &str,
        _options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        Ok(Response::new(StatusCode::OK, HeaderMap::new(), "{}"))
    }
}

fn benchmark_dispatcher(history_capacity: usize) -> Dispatcher<NoopTransport> {
    Dispatcher::with_transport(NoopTransport)
        .try_header("content-type", "application/json")
        .expect("valid header")
        .timeout(Duration::from_secs(42))
        .history_capacity(history_capacity)
        .prepare(|method, url, options: RequestOptions, _args| {
            Ok::<_, std::convert::Infallible>((method, url, options.with_query_pair("v", "2")))
        })
        .build()
        .expect("build benchmark dispatcher")
}

fn bench_dispatch_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_overhead");
    for history_capacity in [0_usize, 16, 1024] {
        let dispatcher = benchmark_dispatcher(history_capacity);
        group.bench_with_input(
            BenchmarkId::new("post_json", history_capacity),
            &dispatcher,
            |b, dispatcher| {
                b.iter(|| {
                    let response = dispatcher
                        .post("https://api.example.com/v1/items")
                        .json_value(json!({ "name": "demo", "enabled": true }))
                        .send()
                        .expect("noop dispatch");
                    black_box(response.status())
                });
            },
        );
    }
    group.finish();
}

fn bench_option_merge(c: &mut Criterion) {
    let defaults = RequestOptions::new()
        .with_timeout(Duration::from_secs(42))
        .with_cookie("session", "abc")
        .with_json(json!({ "default": true }));

    c.bench_function("merge_over_defaults", |b| {
        b.iter(|| {
            let call = RequestOptions::new()
                .with_query_pair("page", "2")
                .with_allow_redirects(true);
            black_box(call.merged_over(&defaults))
        });
    });
}

criterion_group!(benches, bench_dispatch_overhead, bench_option_merge);
criterion_main!(benches);
