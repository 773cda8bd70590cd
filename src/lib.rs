//! `reqdispatch` wraps an HTTP transport with default request options, a prepare hook,
//! a bounded request history and an exception handler for transport failures.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use reqdispatch::prelude::Dispatcher;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder()
//!         .try_header("content-type", "application/json")?
//!         .timeout(Duration::from_secs(10))
//!         .history_capacity(8)
//!         .prepare(|method, url, options, _args| {
//!             Ok::<_, std::convert::Infallible>((method, url, options.with_query_pair("v", "2")))
//!         })
//!         .build()?;
//!
//!     let response = dispatcher
//!         .post("https://api.example.com/items")
//!         .json(&serde_json::json!({ "name": "demo" }))?
//!         .send()?;
//!
//!     println!("status={} sent={:?}", response.status(), dispatcher.last_response_body()?);
//!     Ok(())
//! }
//! ```
//!
//! Defaults are merged shallowly: a call that sets `headers` replaces the default
//! header map rather than extending it.

#[cfg(not(any(feature = "tls-rustls", feature = "tls-native")))]
compile_error!("reqdispatch requires one TLS backend feature: enable `tls-rustls` or `tls-native`");

mod body;
mod builder;
mod dispatcher;
mod error;
mod history;
mod hooks;
mod options;
mod preparation;
mod request;
mod response;
mod tls;
mod transport;
mod util;

pub use crate::builder::DispatcherBuilder;
pub use crate::dispatcher::Dispatcher;
pub use crate::error::{BoxError, Error, ErrorCode, TimeoutPhase, TransportError, TransportErrorKind};
pub use crate::history::HistoryEntry;
pub use crate::hooks::{
    DispatchArgs, ExceptionHandler, ExtraArgs, HandlerContext, PrepareHook, Prepared,
};
pub use crate::options::{
    Auth, ClientIdentity, FilePart, OptionName, Proxies, RequestData, RequestOptions,
    ResponseHook, ResponseHooks, Timeout, Verify,
};
pub use crate::preparation::WithoutPreparation;
pub use crate::request::RequestBuilder;
pub use crate::response::Response;
pub use crate::tls::TlsBackend;
pub use crate::transport::{Transport, UreqTransport, UreqTransportBuilder};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        Auth, DispatchArgs, Dispatcher, Error, ErrorCode, ExtraArgs, HandlerContext,
        HistoryEntry, OptionName, RequestOptions, Response, Timeout, TimeoutPhase, Transport,
        TransportError, UreqTransport, Verify, WithoutPreparation,
    };
}

#[cfg(test)]
mod tests;
