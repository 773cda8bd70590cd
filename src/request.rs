use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::error::{Error, TransportError};
use crate::hooks::{DispatchArgs, ExtraArgs};
use crate::options::{
    Auth, ClientIdentity, FilePart, OptionName, Proxies, RequestData, RequestOptions,
    ResponseHooks, Timeout, Verify,
};
use crate::response::Response;
use crate::transport::Transport;
use crate::util::{parse_header_name, parse_header_value};

/// Call-level options for one request. [`RequestBuilder::send`] runs the dispatch pipeline.
pub struct RequestBuilder<'a, T: Transport> {
    dispatcher: &'a Dispatcher<T>,
    method: Method,
    url: String,
    options: RequestOptions,
    args: DispatchArgs,
}

impl<'a, T: Transport> RequestBuilder<'a, T> {
    pub(crate) fn new(dispatcher: &'a Dispatcher<T>, method: Method, url: String) -> Self {
        Self {
            dispatcher,
            method,
            url,
            options: RequestOptions::default(),
            args: DispatchArgs::default(),
        }
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn query_pair(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with_query_pair(name, value);
        self
    }

    pub fn query<P>(mut self, params: &P) -> crate::Result<Self>
    where
        P: Serialize + ?Sized,
    {
        let encoded = serde_urlencoded::to_string(params)
            .map_err(|source| Error::from(TransportError::SerializeForm { source }))?;
        for (name, value) in url::form_urlencoded::parse(encoded.as_bytes()) {
            self.options = self.options.with_query_pair(name, value);
        }
        Ok(self)
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.options = self.options.with_data(data);
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
        self.options = self.options.with_headers(headers);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.options = self.options.with_header(name, value);
        self
    }

    pub fn try_header(self, name: &str, value: &str) -> crate::Result<Self> {
        let name = parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        Ok(self.header(name, value))
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with_cookie(name, value);
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.options = self.options.with_file(file);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.options = self.options.with_auth(auth);
        self
    }

    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(Auth::basic(username, password))
    }

    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(Auth::bearer(token))
    }

    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    pub fn allow_redirects(mut self, allow_redirects: bool) -> Self {
        self.options = self.options.with_allow_redirects(allow_redirects);
        self
    }

    pub fn proxies(mut self, proxies: Proxies) -> Self {
        self.options = self.options.with_proxies(proxies);
        self
    }

    pub fn hooks(mut self, hooks: ResponseHooks) -> Self {
        self.options = self.options.with_hooks(hooks);
        self
    }

    pub fn response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.options = self.options.with_response_hook(hook);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.options = self.options.with_stream(stream);
        self
    }

    pub fn verify(mut self, verify: impl Into<Verify>) -> Self {
        self.options = self.options.with_verify(verify);
        self
    }

    pub fn cert(mut self, cert: ClientIdentity) -> Self {
        self.options = self.options.with_cert(cert);
        self
    }

    pub fn json<P>(mut self, payload: &P) -> crate::Result<Self>
    where
        P: Serialize + ?Sized,
    {
        let value = serde_json::to_value(payload)
            .map_err(|source| Error::from(TransportError::SerializeJson { source }))?;
        self.options = self.options.with_json(value);
        Ok(self)
    }

    pub fn json_value(mut self, value: Value) -> Self {
        self.options = self.options.with_json(value);
        self
    }

    /// Drops the dispatcher default for `name` on this call.
    pub fn unset(mut self, name: OptionName) -> Self {
        self.options = self.options.unset(name);
        self
    }

    pub fn prepare_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args = self.args.prepare_arg(name, value);
        self
    }

    pub fn prepare_args(mut self, args: ExtraArgs) -> Self {
        self.args.prepare_args = Some(args);
        self
    }

    pub fn handler_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args = self.args.handler_arg(name, value);
        self
    }

    pub fn handler_args(mut self, args: ExtraArgs) -> Self {
        self.args.handler_args = Some(args);
        self
    }

    pub fn send(self) -> crate::Result<Response> {
        self.dispatcher
            .dispatch_with(self.method, self.url, self.options, self.args)
    }

    pub fn send_json<R>(self) -> crate::Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.send()?;
        response.json()
    }
}
