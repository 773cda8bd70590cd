use std::time::Duration;

use http::StatusCode;
use reqdispatch::prelude::{Dispatcher, Error, Response};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::builder()
        .timeout(Duration::from_millis(500))
        .exception_handler(|error, context| {
            eprintln!(
                "recovering {} {} (code={} retry_queue={:?})",
                context.method,
                context.url,
                error.code().as_str(),
                context.extra.get("queue"),
            );
            Response::from_status(StatusCode::SERVICE_UNAVAILABLE)
        })
        .build()?;

    let response = dispatcher
        .get("http://127.0.0.1:9/unreachable")
        .handler_arg("queue", "retry-later")
        .send()?;
    println!("fallback status={}", response.status());

    let strict = Dispatcher::builder()
        .timeout(Duration::from_millis(500))
        .build()?;
    match strict.get("http://127.0.0.1:9/unreachable").send() {
        Ok(response) => println!("unexpected success: status={}", response.status()),
        Err(Error::Transport(error)) => {
            println!("transport error code={} kind={:?}", error.code().as_str(), error.kind());
        }
        Err(other) => println!("other error: {other}"),
    }
    Ok(())
}
