use std::time::Duration;

use reqdispatch::prelude::{Dispatcher, RequestOptions};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::builder()
        .try_header("content-type", "application/json")?
        .timeout(Duration::from_secs(42))
        .history_capacity(3)
        .prepare(|method, url, options: RequestOptions, _args| {
            Ok::<_, std::convert::Infallible>((method, url, options.with_query_pair("from", "reqdispatch")))
        })
        .build()?;

    for index in 1..=4 {
        let response = dispatcher
            .post(format!("https://httpbin.org/delay/{index}"))
            .json(&json!({ "my": index }))?
            .send()?;
        println!("POST /delay/{index} => status={}", response.status());
    }

    for entry in dispatcher.history() {
        println!("history: {} {}", entry.method, entry.url);
    }
    println!("last json body: {:?}", dispatcher.last_response_body()?);

    let bypass = dispatcher.without_preparation();
    let raw = bypass.get("https://httpbin.org/get").send()?;
    println!("GET /get without preparation => status={}", raw.status());
    Ok(())
}
