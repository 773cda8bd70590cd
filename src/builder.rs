use std::fmt;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::Serialize;
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::error::{BoxError, Error, TransportError};
use crate::hooks::{ExceptionHandler, ExtraArgs, HandlerContext, PrepareHook, Prepared};
use crate::options::{
    Auth, ClientIdentity, FilePart, Proxies, RequestData, RequestOptions, ResponseHooks, Timeout,
    Verify,
};
use crate::response::Response;
use crate::transport::Transport;
use crate::util::{parse_header_name, parse_header_value};

/// Configures a [`Dispatcher`]. Options set here become the defaults of every request.
pub struct DispatcherBuilder<T> {
    transport: crate::Result<T>,
    default_options: RequestOptions,
    prepare: Option<PrepareHook>,
    exception_handler: Option<ExceptionHandler>,
    history_capacity: usize,
}

impl<T: Transport> DispatcherBuilder<T> {
    pub(crate) fn new(transport: crate::Result<T>) -> Self {
        Self {
            transport,
            default_options: RequestOptions::default(),
            prepare: None,
            exception_handler: None,
            history_capacity: 0,
        }
    }

    pub fn transport<U: Transport>(self, transport: U) -> DispatcherBuilder<U> {
        DispatcherBuilder {
            transport: Ok(transport),
            default_options: self.default_options,
            prepare: self.prepare,
            exception_handler: self.exception_handler,
            history_capacity: self.history_capacity,
        }
    }

    /// Replaces every default option at once.
    pub fn default_options(mut self, options: RequestOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn params<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.default_options = self.default_options.with_params(pairs);
        self
    }

    pub fn query_pair(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_options = self.default_options.with_query_pair(name, value);
        self
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.default_options = self.default_options.with_data(data);
        self
    }

    pub fn form<I, K, V>(self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.data(RequestData::Form(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        ))
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.default_options = self.default_options.with_headers(headers);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_options = self.default_options.with_header(name, value);
        self
    }

    pub fn try_header(self, name: &str, value: &str) -> crate::Result<Self> {
        let name = parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        Ok(self.header(name, value))
    }

    pub fn cookies<K, V, I>(mut self, cookies: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.default_options = self.default_options.with_cookies(cookies);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_options = self.default_options.with_cookie(name, value);
        self
    }

    pub fn files(mut self, files: Vec<FilePart>) -> Self {
        self.default_options = self.default_options.with_files(files);
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.default_options = self.default_options.with_file(file);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.default_options = self.default_options.with_auth(auth);
        self
    }

    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(Auth::basic(username, password))
    }

    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(Auth::bearer(token))
    }

    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.default_options = self.default_options.with_timeout(timeout);
        self
    }

    pub fn allow_redirects(mut self, allow_redirects: bool) -> Self {
        self.default_options = self.default_options.with_allow_redirects(allow_redirects);
        self
    }

    pub fn proxies(mut self, proxies: Proxies) -> Self {
        self.default_options = self.default_options.with_proxies(proxies);
        self
    }

    pub fn proxy(mut self, scheme: impl Into<String>, proxy_url: impl Into<String>) -> Self {
        self.default_options = self.default_options.with_proxy(scheme, proxy_url);
        self
    }

    pub fn hooks(mut self, hooks: ResponseHooks) -> Self {
        self.default_options = self.default_options.with_hooks(hooks);
        self
    }

    pub fn response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.default_options = self.default_options.with_response_hook(hook);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.default_options = self.default_options.with_stream(stream);
        self
    }

    pub fn verify(mut self, verify: impl Into<Verify>) -> Self {
        self.default_options = self.default_options.with_verify(verify);
        self
    }

    pub fn cert(mut self, cert: ClientIdentity) -> Self {
        self.default_options = self.default_options.with_cert(cert);
        self
    }

    pub fn json<P>(mut self, payload: &P) -> crate::Result<Self>
    where
        P: Serialize + ?Sized,
    {
        let value = serde_json::to_value(payload)
            .map_err(|source| Error::from(TransportError::SerializeJson { source }))?;
        self.default_options = self.default_options.with_json(value);
        Ok(self)
    }

    pub fn json_value(mut self, value: Value) -> Self {
        self.default_options = self.default_options.with_json(value);
        self
    }

    /// Hook called with `(method, url, call options, prepare args)` before every
    /// request while `use_prepare` is on.
    pub fn prepare<F, E>(mut self, hook: F) -> Self
    where
        F: Fn(Method, String, RequestOptions, &ExtraArgs) -> Result<Prepared, E>
            + Send
            + Sync
            + 'static,
        E: Into<BoxError>,
    {
        self.prepare = Some(Arc::new(
            move |method: Method,
                  url: String,
                  options: RequestOptions,
                  args: &ExtraArgs|
                  -> Result<Prepared, BoxError> {
                hook(method, url, options, args).map_err(Into::into)
            },
        ));
        self
    }

    pub fn prepare_hook(mut self, hook: PrepareHook) -> Self {
        self.prepare = Some(hook);
        self
    }

    pub fn exception_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(TransportError, &HandlerContext) -> Response + Send + Sync + 'static,
    {
        self.exception_handler = Some(Arc::new(handler));
        self
    }

    /// Number of recent requests kept for inspection. 0 keeps none.
    pub fn history_capacity(mut self, history_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self
    }

    pub fn build(self) -> crate::Result<Dispatcher<T>> {
        validate_default_options(&self.default_options)?;
        let transport = self.transport?;
        Ok(Dispatcher::from_parts(
            transport,
            self.default_options,
            self.prepare,
            self.exception_handler,
            self.history_capacity,
        ))
    }
}

impl<T> fmt::Debug for DispatcherBuilder<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DispatcherBuilder")
            .field("transport_ready", &self.transport.is_ok())
            .field("default_options", &self.default_options)
            .field("prepare", &self.prepare.is_some())
            .field("exception_handler", &self.exception_handler.is_some())
            .field("history_capacity", &self.history_capacity)
            .finish_non_exhaustive()
    }
}

fn validate_default_options(options: &RequestOptions) -> crate::Result<()> {
    if let Some(proxies) = &options.proxies {
        for (scheme, proxy_url) in proxies.iter() {
            url::Url::parse(proxy_url).map_err(|source| Error::InvalidOption {
                name: "proxies",
                message: format!("proxy for {scheme} is not a valid url: {source}"),
            })?;
        }
    }
    if let Some(Verify::CaBundle(pem)) = &options.verify
        && pem.is_empty()
    {
        return Err(Error::InvalidOption {
            name: "verify",
            message: "ca bundle is empty".to_owned(),
        });
    }
    if let Some(cert) = &options.cert
        && (cert.cert_chain_pem.is_empty() || cert.private_key_pem.is_empty())
    {
        return Err(Error::InvalidOption {
            name: "cert",
            message: "client identity needs both a certificate chain and a private key".to_owned(),
        });
    }
    if let Some(Timeout {
        connect: Some(connect),
        ..
    }) = options.timeout
        && connect.is_zero()
    {
        return Err(Error::InvalidOption {
            name: "timeout",
            message: "connect timeout must be greater than zero".to_owned(),
        });
    }
    Ok(())
}
