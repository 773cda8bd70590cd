use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use serde_json::Value;

use crate::response::Response;

/// Names of the options a [`RequestOptions`] can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionName {
    Params,
    Data,
    Headers,
    Cookies,
    Files,
    Auth,
    Timeout,
    AllowRedirects,
    Proxies,
    Hooks,
    Stream,
    Verify,
    Cert,
    Json,
}

impl OptionName {
    pub const ALL: [Self; 14] = [
        Self::Params,
        Self::Data,
        Self::Headers,
        Self::Cookies,
        Self::Files,
        Self::Auth,
        Self::Timeout,
        Self::AllowRedirects,
        Self::Proxies,
        Self::Hooks,
        Self::Stream,
        Self::Verify,
        Self::Cert,
        Self::Json,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Data => "data",
            Self::Headers => "headers",
            Self::Cookies => "cookies",
            Self::Files => "files",
            Self::Auth => "auth",
            Self::Timeout => "timeout",
            Self::AllowRedirects => "allow_redirects",
            Self::Proxies => "proxies",
            Self::Hooks => "hooks",
            Self::Stream => "stream",
            Self::Verify => "verify",
            Self::Cert => "cert",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestData {
    Bytes(Bytes),
    Text(String),
    /// Sent as `application/x-www-form-urlencoded`, or as text fields when files are attached.
    Form(Vec<(String, String)>),
}

impl From<Bytes> for RequestData {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for RequestData {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<String> for RequestData {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestData {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl FilePart {
    pub fn new(field: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            file_name: None,
            content_type: None,
            content: content.into(),
        }
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer(String),
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    pub(crate) fn authorization_value(&self) -> String {
        match self {
            Self::Basic { username, password } => {
                let credentials = format!("{username}:{}", password.as_deref().unwrap_or(""));
                format!("Basic {}", STANDARD.encode(credentials))
            }
            Self::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => formatter
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer(_) => formatter.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Connect and read timeouts handed to the transport.
///
/// A plain [`Duration`] applies to both phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timeout {
    pub connect: Option<Duration>,
    pub read: Option<Duration>,
}

impl Timeout {
    pub const fn new(connect: Duration, read: Duration) -> Self {
        Self {
            connect: Some(connect),
            read: Some(read),
        }
    }

    pub const fn from_secs(secs: u64) -> Self {
        let duration = Duration::from_secs(secs);
        Self::new(duration, duration)
    }

    pub const fn read_only(read: Duration) -> Self {
        Self {
            connect: None,
            read: Some(read),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        Self::new(value, value)
    }
}

/// Proxy URLs keyed by url scheme. The `all` key matches any scheme.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Proxies {
    entries: BTreeMap<String, String>,
}

impl Proxies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scheme: impl Into<String>, proxy_url: impl Into<String>) -> Self {
        self.insert(scheme, proxy_url);
        self
    }

    pub fn insert(&mut self, scheme: impl Into<String>, proxy_url: impl Into<String>) {
        self.entries
            .insert(scheme.into().to_ascii_lowercase(), proxy_url.into());
    }

    pub fn for_scheme(&self, scheme: &str) -> Option<&str> {
        self.entries
            .get(&scheme.to_ascii_lowercase())
            .or_else(|| self.entries.get("all"))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(scheme, proxy_url)| (scheme.as_str(), proxy_url.as_str()))
    }
}

pub type ResponseHook = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Response hooks run by the transport, in order, on every received response.
#[derive(Clone, Default)]
pub struct ResponseHooks(Vec<ResponseHook>);

impl ResponseHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.0.push(Arc::new(hook));
        self
    }

    pub fn push(&mut self, hook: ResponseHook) {
        self.0.push(hook);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn apply(&self, response: Response) -> Response {
        self.0.iter().fold(response, |response, hook| hook(response))
    }
}

impl fmt::Debug for ResponseHooks {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResponseHooks")
            .field("len", &self.0.len())
            .finish()
    }
}

impl PartialEq for ResponseHooks {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(left, right)| Arc::ptr_eq(left, right))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Verify {
    #[default]
    Enabled,
    Disabled,
    /// PEM bundle of trusted roots that replaces the default store.
    CaBundle(Vec<u8>),
}

impl From<bool> for Verify {
    fn from(value: bool) -> Self {
        if value { Self::Enabled } else { Self::Disabled }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub cert_chain_pem: Vec<u8>,
    pub private_key_pem: Vec<u8>,
}

impl ClientIdentity {
    pub fn from_pem(cert_chain_pem: impl Into<Vec<u8>>, private_key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_chain_pem: cert_chain_pem.into(),
            private_key_pem: private_key_pem.into(),
        }
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientIdentity")
            .field("cert_chain_pem_len", &self.cert_chain_pem.len())
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Options for a single request, or the defaults a dispatcher applies to every request.
///
/// `None` means unset. When call options are merged over defaults, every set call
/// option wins and every unset one falls back to the default. [`RequestOptions::unset`]
/// marks an option as explicitly unset so the default is dropped too.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    pub params: Option<Vec<(String, String)>>,
    pub data: Option<RequestData>,
    pub headers: Option<HeaderMap>,
    pub cookies: Option<Vec<(String, String)>>,
    pub files: Option<Vec<FilePart>>,
    pub auth: Option<Auth>,
    pub timeout: Option<Timeout>,
    pub allow_redirects: Option<bool>,
    pub proxies: Option<Proxies>,
    pub hooks: Option<ResponseHooks>,
    pub stream: Option<bool>,
    pub verify: Option<Verify>,
    pub cert: Option<ClientIdentity>,
    pub json: Option<Value>,
    unset: BTreeSet<OptionName>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.params = Some(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
        self
    }

    pub fn with_query_pair(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn with_data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    pub fn with_cookies<K, V, I>(mut self, cookies: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.cookies = Some(
            cookies
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn with_files(mut self, files: Vec<FilePart>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_file(mut self, file: FilePart) -> Self {
        self.files.get_or_insert_with(Vec::new).push(file);
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn with_allow_redirects(mut self, allow_redirects: bool) -> Self {
        self.allow_redirects = Some(allow_redirects);
        self
    }

    pub fn with_proxies(mut self, proxies: Proxies) -> Self {
        self.proxies = Some(proxies);
        self
    }

    pub fn with_proxy(mut self, scheme: impl Into<String>, proxy_url: impl Into<String>) -> Self {
        self.proxies
            .get_or_insert_with(Proxies::new)
            .insert(scheme, proxy_url);
        self
    }

    pub fn with_hooks(mut self, hooks: ResponseHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.hooks
            .get_or_insert_with(ResponseHooks::new)
            .push(Arc::new(hook));
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_verify(mut self, verify: impl Into<Verify>) -> Self {
        self.verify = Some(verify.into());
        self
    }

    pub fn with_cert(mut self, cert: ClientIdentity) -> Self {
        self.cert = Some(cert);
        self
    }

    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    /// Clears `name` and keeps it unset through a merge with defaults.
    pub fn unset(mut self, name: OptionName) -> Self {
        self.clear(name);
        self.unset.insert(name);
        self
    }

    pub fn clear(&mut self, name: OptionName) {
        match name {
            OptionName::Params => self.params = None,
            OptionName::Data => self.data = None,
            OptionName::Headers => self.headers = None,
            OptionName::Cookies => self.cookies = None,
            OptionName::Files => self.files = None,
            OptionName::Auth => self.auth = None,
            OptionName::Timeout => self.timeout = None,
            OptionName::AllowRedirects => self.allow_redirects = None,
            OptionName::Proxies => self.proxies = None,
            OptionName::Hooks => self.hooks = None,
            OptionName::Stream => self.stream = None,
            OptionName::Verify => self.verify = None,
            OptionName::Cert => self.cert = None,
            OptionName::Json => self.json = None,
        }
    }

    pub fn is_set(&self, name: OptionName) -> bool {
        match name {
            OptionName::Params => self.params.is_some(),
            OptionName::Data => self.data.is_some(),
            OptionName::Headers => self.headers.is_some(),
            OptionName::Cookies => self.cookies.is_some(),
            OptionName::Files => self.files.is_some(),
            OptionName::Auth => self.auth.is_some(),
            OptionName::Timeout => self.timeout.is_some(),
            OptionName::AllowRedirects => self.allow_redirects.is_some(),
            OptionName::Proxies => self.proxies.is_some(),
            OptionName::Hooks => self.hooks.is_some(),
            OptionName::Stream => self.stream.is_some(),
            OptionName::Verify => self.verify.is_some(),
            OptionName::Cert => self.cert.is_some(),
            OptionName::Json => self.json.is_some(),
        }
    }

    pub fn is_unset_explicitly(&self, name: OptionName) -> bool {
        !self.is_set(name) && self.unset.contains(&name)
    }

    /// Names of the options that carry a value, in declaration order.
    pub fn names(&self) -> Vec<OptionName> {
        OptionName::ALL
            .into_iter()
            .filter(|name| self.is_set(*name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        OptionName::ALL.into_iter().all(|name| !self.is_set(name))
    }

    /// Overlays `self` on `defaults`. Values are replaced whole, never combined.
    pub fn merged_over(self, defaults: &Self) -> Self {
        let unset = self.unset;
        let pick = |name: OptionName| !unset.contains(&name);
        Self {
            params: self
                .params
                .or_else(|| pick(OptionName::Params).then(|| defaults.params.clone())?),
            data: self
                .data
                .or_else(|| pick(OptionName::Data).then(|| defaults.data.clone())?),
            headers: self
                .headers
                .or_else(|| pick(OptionName::Headers).then(|| defaults.headers.clone())?),
            cookies: self
                .cookies
                .or_else(|| pick(OptionName::Cookies).then(|| defaults.cookies.clone())?),
            files: self
                .files
                .or_else(|| pick(OptionName::Files).then(|| defaults.files.clone())?),
            auth: self
                .auth
                .or_else(|| pick(OptionName::Auth).then(|| defaults.auth.clone())?),
            timeout: self
                .timeout
                .or_else(|| pick(OptionName::Timeout).then_some(defaults.timeout)?),
            allow_redirects: self.allow_redirects.or_else(|| {
                pick(OptionName::AllowRedirects).then_some(defaults.allow_redirects)?
            }),
            proxies: self
                .proxies
                .or_else(|| pick(OptionName::Proxies).then(|| defaults.proxies.clone())?),
            hooks: self
                .hooks
                .or_else(|| pick(OptionName::Hooks).then(|| defaults.hooks.clone())?),
            stream: self
                .stream
                .or_else(|| pick(OptionName::Stream).then_some(defaults.stream)?),
            verify: self
                .verify
                .or_else(|| pick(OptionName::Verify).then(|| defaults.verify.clone())?),
            cert: self
                .cert
                .or_else(|| pick(OptionName::Cert).then(|| defaults.cert.clone())?),
            json: self
                .json
                .or_else(|| pick(OptionName::Json).then(|| defaults.json.clone())?),
            unset: BTreeSet::new(),
        }
    }
}
