use std::collections::BTreeMap;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use crate::error::{BoxError, TransportError};
use crate::options::RequestOptions;
use crate::response::Response;

/// Named arguments forwarded to the prepare hook or the exception handler for one call.
pub type ExtraArgs = BTreeMap<String, Value>;

/// The method, url and options a prepare hook hands back.
pub type Prepared = (Method, String, RequestOptions);

/// Rewrites a request before it is merged with defaults and sent.
///
/// Receives the call-level options only. An error aborts the dispatch and reaches
/// the caller as [`Error::Prepare`](crate::Error::Prepare).
pub type PrepareHook =
    Arc<dyn Fn(Method, String, RequestOptions, &ExtraArgs) -> Result<Prepared, BoxError> + Send + Sync>;

/// Turns a transport failure into the response returned to the caller.
pub type ExceptionHandler = Arc<dyn Fn(TransportError, &HandlerContext) -> Response + Send + Sync>;

/// The request an exception handler is recovering from.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    pub method: Method,
    pub url: String,
    /// Merged options that were passed to the transport.
    pub params: RequestOptions,
    pub extra: ExtraArgs,
}

/// Per-call extra arguments for [`Dispatcher::dispatch_with`](crate::Dispatcher::dispatch_with).
#[derive(Clone, Debug, Default)]
pub struct DispatchArgs {
    pub prepare_args: Option<ExtraArgs>,
    pub handler_args: Option<ExtraArgs>,
}

impl DispatchArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prepare_args
            .get_or_insert_with(ExtraArgs::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn handler_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.handler_args
            .get_or_insert_with(ExtraArgs::new)
            .insert(name.into(), value.into());
        self
    }
}
