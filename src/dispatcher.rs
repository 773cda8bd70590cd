use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use http::Method;
use serde_json::Value;
use tracing::{debug, info_span, warn};

use crate::builder::DispatcherBuilder;
use crate::error::Error;
use crate::history::{History, HistoryEntry};
use crate::hooks::{DispatchArgs, ExceptionHandler, ExtraArgs, HandlerContext, PrepareHook};
use crate::options::{OptionName, RequestOptions};
use crate::preparation::WithoutPreparation;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::transport::{Transport, UreqTransport};
use crate::util::redact_uri_for_logs;

/// Decorates a [`Transport`] with default options, a prepare hook, a bounded request
/// history and an optional exception handler.
///
/// Every call runs the same pipeline: prepare hook, merge over the defaults, record in
/// history, transport call, and on transport failure the exception handler.
///
/// State is shared by every caller of one instance. Concurrent callers see each
/// other's `use_prepare` changes and interleave their history entries.
pub struct Dispatcher<T = UreqTransport> {
    transport: T,
    default_options: RequestOptions,
    prepare: Option<PrepareHook>,
    exception_handler: Option<ExceptionHandler>,
    use_prepare: AtomicBool,
    history: History,
}

impl Dispatcher<UreqTransport> {
    pub fn builder() -> DispatcherBuilder<UreqTransport> {
        DispatcherBuilder::new(UreqTransport::builder().build())
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn with_transport(transport: T) -> DispatcherBuilder<T> {
        DispatcherBuilder::new(Ok(transport))
    }

    pub(crate) fn from_parts(
        transport: T,
        default_options: RequestOptions,
        prepare: Option<PrepareHook>,
        exception_handler: Option<ExceptionHandler>,
        history_capacity: usize,
    ) -> Self {
        Self {
            transport,
            default_options,
            prepare,
            exception_handler,
            use_prepare: AtomicBool::new(true),
            history: History::new(history_capacity),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn default_options(&self) -> &RequestOptions {
        &self.default_options
    }

    pub fn has_prepare_hook(&self) -> bool {
        self.prepare.is_some()
    }

    pub fn has_exception_handler(&self) -> bool {
        self.exception_handler.is_some()
    }

    pub fn use_prepare(&self) -> bool {
        self.use_prepare.load(Ordering::SeqCst)
    }

    pub fn set_use_prepare(&self, use_prepare: bool) {
        self.use_prepare.store(use_prepare, Ordering::SeqCst);
    }

    /// Disables the prepare hook until the returned guard is dropped.
    pub fn without_preparation(&self) -> WithoutPreparation<'_, T> {
        WithoutPreparation::new(self)
    }

    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Recorded requests, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// The `json` option of the most recent recorded request.
    ///
    /// Fails with [`Error::EmptyHistory`] when nothing was recorded, which is always
    /// the case with a history capacity of 0.
    pub fn last_response_body(&self) -> crate::Result<Option<Value>> {
        self.history
            .with_last(|entry| entry.options.json.clone())
            .ok_or(Error::EmptyHistory)
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, method, url.into())
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::GET, url).allow_redirects(true)
    }

    pub fn options(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::OPTIONS, url).allow_redirects(true)
    }

    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::HEAD, url).allow_redirects(false)
    }

    /// Drops the `data` and `json` defaults unless the call sets them.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::POST, url)
            .unset(OptionName::Data)
            .unset(OptionName::Json)
    }

    /// Drops the `data` default unless the call sets it.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::PUT, url).unset(OptionName::Data)
    }

    /// Drops the `data` default unless the call sets it.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::PATCH, url).unset(OptionName::Data)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        self.request(Method::DELETE, url)
    }

    pub fn dispatch(
        &self,
        method: Method,
        url: impl Into<String>,
        options: RequestOptions,
    ) -> crate::Result<Response> {
        self.dispatch_with(method, url, options, DispatchArgs::default())
    }

    pub fn dispatch_with(
        &self,
        method: Method,
        url: impl Into<String>,
        options: RequestOptions,
        args: DispatchArgs,
    ) -> crate::Result<Response> {
        let url: String = url.into();
        let span = info_span!(
            "reqdispatch.dispatch",
            method = %method,
            uri = %redact_uri_for_logs(&url)
        );
        let _entered = span.enter();

        let (method, url, options) =
            self.prepare_request(method, url, options, args.prepare_args)?;
        let options = options.merged_over(&self.default_options);

        self.history.record(HistoryEntry {
            method: method.clone(),
            url: url.clone(),
            options: options.clone(),
        });

        debug!(options = %option_names(&options), "calling transport");
        let started = Instant::now();
        match self.transport.call(&method, &url, &options) {
            Ok(response) => {
                debug!(
                    status = response.status().as_u16(),
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "request completed"
                );
                Ok(response)
            }
            Err(error) => {
                let Some(handler) = &self.exception_handler else {
                    debug!(error = %error, "transport error returned to caller");
                    return Err(error.into());
                };
                warn!(
                    error = %error,
                    code = error.code().as_str(),
                    "transport error intercepted by exception handler"
                );
                let context = HandlerContext {
                    method,
                    url,
                    params: options,
                    extra: args.handler_args.unwrap_or_default(),
                };
                Ok(handler(error, &context))
            }
        }
    }

    fn prepare_request(
        &self,
        method: Method,
        url: String,
        options: RequestOptions,
        prepare_args: Option<ExtraArgs>,
    ) -> crate::Result<(Method, String, RequestOptions)> {
        let Some(prepare) = self.prepare.as_ref().filter(|_| self.use_prepare()) else {
            return Ok((method, url, options));
        };

        let prepare_args = prepare_args.unwrap_or_default();
        let (method, url, options) = prepare(method, url, options, &prepare_args).map_err(|error| {
            debug!(error = %error, "prepare hook failed");
            Error::Prepare(error)
        })?;
        debug!(
            method = %method,
            uri = %redact_uri_for_logs(&url),
            "prepare hook rewrote request"
        );
        Ok((method, url, options))
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("default_options", &self.default_options)
            .field("prepare", &self.prepare.is_some())
            .field("exception_handler", &self.exception_handler.is_some())
            .field("use_prepare", &self.use_prepare.load(Ordering::SeqCst))
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

fn option_names(options: &RequestOptions) -> String {
    options
        .names()
        .into_iter()
        .map(OptionName::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
