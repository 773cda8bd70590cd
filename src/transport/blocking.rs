use std::borrow::Cow;
use std::io::Read;
use std::time::Duration;

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderValue};
use http::{HeaderMap, Method};
use tracing::debug;

use crate::body::encode_body;
use crate::error::{TimeoutPhase, TransportError, TransportErrorKind};
use crate::options::{Auth, RequestOptions, Timeout, Verify};
use crate::response::Response;
use crate::tls::{TlsBackend, build_tls_config, default_tls_backend};
use crate::util::{append_query_pairs, redact_uri_for_logs};

use super::Transport;

const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;
const DEFAULT_POOL_MAX_IDLE_CONNECTIONS: usize = 16;
const DEFAULT_CLIENT_NAME: &str = "reqdispatch";
const DEFAULT_MAX_RESPONSE_BODY_BYTES: usize = 8 * 1024 * 1024;
const DEFAULT_MAX_REDIRECTS: u32 = 30;

#[derive(Clone, Debug)]
struct AgentSettings {
    client_name: String,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    pool_max_idle_connections: usize,
}

pub struct UreqTransportBuilder {
    settings: AgentSettings,
    max_response_body_bytes: usize,
    tls_backend: TlsBackend,
}

/// Blocking [`Transport`] backed by a pooled `ureq` agent.
///
/// Calls that set `proxies`, `cert` or a non-default `verify` run on a dedicated
/// agent built for that call.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    settings: AgentSettings,
    max_response_body_bytes: usize,
    tls_backend: TlsBackend,
}

impl Default for UreqTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransportBuilder {
    pub fn new() -> Self {
        Self {
            settings: AgentSettings {
                client_name: DEFAULT_CLIENT_NAME.to_owned(),
                pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
                pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
                pool_max_idle_connections: DEFAULT_POOL_MAX_IDLE_CONNECTIONS,
            },
            max_response_body_bytes: DEFAULT_MAX_RESPONSE_BODY_BYTES,
            tls_backend: default_tls_backend(),
        }
    }

    pub fn client_name(mut self, client_name: impl Into<String>) -> Self {
        self.settings.client_name = client_name.into();
        self
    }

    pub fn pool_idle_timeout(mut self, pool_idle_timeout: Duration) -> Self {
        self.settings.pool_idle_timeout = pool_idle_timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, pool_max_idle_per_host: usize) -> Self {
        self.settings.pool_max_idle_per_host = pool_max_idle_per_host;
        self
    }

    pub fn pool_max_idle_connections(mut self, pool_max_idle_connections: usize) -> Self {
        self.settings.pool_max_idle_connections = pool_max_idle_connections;
        self
    }

    pub fn max_response_body_bytes(mut self, max_response_body_bytes: usize) -> Self {
        self.max_response_body_bytes = max_response_body_bytes.max(1);
        self
    }

    pub fn tls_backend(mut self, tls_backend: TlsBackend) -> Self {
        self.tls_backend = tls_backend;
        self
    }

    pub fn build(self) -> crate::Result<UreqTransport> {
        if !self.tls_backend.is_available() {
            return Err(TransportError::TlsConfig {
                backend: self.tls_backend.as_str(),
                message: "tls backend is not enabled in this build".to_owned(),
            }
            .into());
        }

        let tls_config = build_tls_config(self.tls_backend, &Verify::Enabled, None)?;
        Ok(UreqTransport {
            agent: make_agent(&self.settings, tls_config, None),
            settings: self.settings,
            max_response_body_bytes: self.max_response_body_bytes,
            tls_backend: self.tls_backend,
        })
    }
}

impl UreqTransport {
    pub fn builder() -> UreqTransportBuilder {
        UreqTransportBuilder::new()
    }

    pub fn tls_backend(&self) -> TlsBackend {
        self.tls_backend
    }

    fn agent_for(
        &self,
        url: &url::Url,
        options: &RequestOptions,
    ) -> Result<Cow<'_, ureq::Agent>, TransportError> {
        let proxy_url = options
            .proxies
            .as_ref()
            .and_then(|proxies| proxies.for_scheme(url.scheme()));
        let verify = options.verify.clone().unwrap_or_default();
        if proxy_url.is_none() && verify == Verify::Enabled && options.cert.is_none() {
            return Ok(Cow::Borrowed(&self.agent));
        }

        debug!(
            proxy = proxy_url.is_some(),
            verify = verify_label(&verify),
            client_cert = options.cert.is_some(),
            "building dedicated transport agent"
        );
        let proxy = proxy_url
            .map(|proxy_url| {
                ureq::Proxy::new(proxy_url).map_err(|source| TransportError::InvalidProxy {
                    proxy: redact_uri_for_logs(proxy_url),
                    source: Box::new(source),
                })
            })
            .transpose()?;
        let tls_config = build_tls_config(self.tls_backend, &verify, options.cert.as_ref())?;
        Ok(Cow::Owned(make_agent(&self.settings, tls_config, proxy)))
    }
}

impl Transport for UreqTransport {
    fn call(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let mut parsed = parse_url(url)?;
        if let Some(params) = &options.params {
            append_query_pairs(&mut parsed, params);
        }
        let uri_text = parsed.to_string();
        let redacted_uri = redact_uri_for_logs(&uri_text);

        let mut headers = options.headers.clone().unwrap_or_default();
        apply_cookies(&mut headers, options.cookies.as_deref())?;
        apply_auth(&mut headers, options.auth.as_ref())?;
        let body = match encode_body(options)? {
            Some(encoded) => {
                if let Some(content_type) = encoded.content_type
                    && !headers.contains_key(CONTENT_TYPE)
                {
                    headers.insert(CONTENT_TYPE, content_type);
                }
                encoded.bytes
            }
            None => Bytes::new(),
        };

        let agent = self.agent_for(&parsed, options)?;
        let mut builder = ureq::http::Request::builder()
            .method(method.clone())
            .uri(uri_text.as_str());
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(body.to_vec())
            .map_err(|source| TransportError::RequestBuild { source })?;

        let timeout = options.timeout.unwrap_or_default();
        let max_redirects = if options.allow_redirects.unwrap_or(true) {
            DEFAULT_MAX_REDIRECTS
        } else {
            0
        };
        let configured_request = agent
            .configure_request(request)
            .timeout_connect(timeout.connect)
            .timeout_recv_response(timeout.read)
            .timeout_recv_body(timeout.read)
            .max_redirects(max_redirects)
            .build();

        let mut response = agent
            .run(configured_request)
            .map_err(|source| map_ureq_error(source, method, &redacted_uri, timeout))?;
        let status = response.status();
        let response_headers = response.headers().clone();

        let response = if options.stream.unwrap_or(false) {
            let reader = response.into_body().into_reader();
            Response::streaming(status, response_headers, reader)
        } else {
            let body = read_all_body_limited(&mut response, self.max_response_body_bytes)
                .map_err(|error| match error {
                    ReadBodyError::Read(source) => {
                        read_body_error(source, method, &redacted_uri, timeout)
                    }
                    ReadBodyError::TooLarge { actual_bytes } => {
                        TransportError::ResponseBodyTooLarge {
                            limit_bytes: self.max_response_body_bytes,
                            actual_bytes,
                            method: method.clone(),
                            uri: redacted_uri.clone(),
                        }
                    }
                })?;
            Response::new(status, response_headers, body)
        }
        .with_url(uri_text);

        Ok(match &options.hooks {
            Some(hooks) => hooks.apply(response),
            None => response,
        })
    }
}

fn make_agent(
    settings: &AgentSettings,
    tls_config: ureq::tls::TlsConfig,
    proxy: Option<ureq::Proxy>,
) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .user_agent(settings.client_name.as_str())
        .max_idle_age(settings.pool_idle_timeout)
        .max_idle_connections_per_host(settings.pool_max_idle_per_host)
        .max_idle_connections(settings.pool_max_idle_connections)
        .tls_config(tls_config)
        .proxy(proxy)
        .build();
    config.new_agent()
}

fn verify_label(verify: &Verify) -> &'static str {
    match verify {
        Verify::Enabled => "enabled",
        Verify::Disabled => "disabled",
        Verify::CaBundle(_) => "ca_bundle",
    }
}

fn parse_url(url: &str) -> Result<url::Url, TransportError> {
    let invalid = || TransportError::InvalidUrl {
        url: redact_uri_for_logs(url),
    };
    let parsed = url::Url::parse(url).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(parsed)
}

fn apply_cookies(
    headers: &mut HeaderMap,
    cookies: Option<&[(String, String)]>,
) -> Result<(), TransportError> {
    let Some(cookies) = cookies.filter(|cookies| !cookies.is_empty()) else {
        return Ok(());
    };

    let mut joined = cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    if let Some(existing) = headers.get(COOKIE).and_then(|value| value.to_str().ok()) {
        joined = format!("{existing}; {joined}");
    }
    let value =
        HeaderValue::from_str(&joined).map_err(|source| TransportError::InvalidHeaderValue {
            name: COOKIE.as_str().to_owned(),
            source,
        })?;
    headers.insert(COOKIE, value);
    Ok(())
}

fn apply_auth(headers: &mut HeaderMap, auth: Option<&Auth>) -> Result<(), TransportError> {
    let Some(auth) = auth else {
        return Ok(());
    };
    let mut value = HeaderValue::from_str(&auth.authorization_value()).map_err(|source| {
        TransportError::InvalidHeaderValue {
            name: AUTHORIZATION.as_str().to_owned(),
            source,
        }
    })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

fn timeout_ms(timeout: Option<Duration>) -> u128 {
    timeout.map(|timeout| timeout.as_millis()).unwrap_or_default()
}

fn map_ureq_error(
    error: ureq::Error,
    method: &Method,
    redacted_uri: &str,
    timeout: Timeout,
) -> TransportError {
    match error {
        ureq::Error::Timeout(which) => {
            let (phase, limit) = match which {
                ureq::Timeout::Resolve | ureq::Timeout::Connect => {
                    (TimeoutPhase::Connect, timeout.connect)
                }
                ureq::Timeout::RecvBody => (TimeoutPhase::ResponseBody, timeout.read),
                _ => (TimeoutPhase::Response, timeout.read),
            };
            TransportError::Timeout {
                phase,
                timeout_ms: timeout_ms(limit),
                method: method.clone(),
                uri: redacted_uri.to_owned(),
            }
        }
        other => TransportError::Transport {
            kind: classify_ureq_transport_error(&other),
            method: method.clone(),
            uri: redacted_uri.to_owned(),
            source: Box::new(other),
        },
    }
}

fn read_body_error(
    source: std::io::Error,
    method: &Method,
    redacted_uri: &str,
    timeout: Timeout,
) -> TransportError {
    if source.kind() == std::io::ErrorKind::TimedOut
        || wrapped_ureq_error(&source).is_some_and(|error| matches!(error, ureq::Error::Timeout(_)))
    {
        return TransportError::Timeout {
            phase: TimeoutPhase::ResponseBody,
            timeout_ms: timeout_ms(timeout.read),
            method: method.clone(),
            uri: redacted_uri.to_owned(),
        };
    }
    TransportError::ReadBody {
        method: method.clone(),
        uri: redacted_uri.to_owned(),
        source: Box::new(source),
    }
}

fn classify_ureq_transport_error(error: &ureq::Error) -> TransportErrorKind {
    match error {
        ureq::Error::HostNotFound => TransportErrorKind::Dns,
        ureq::Error::Tls(_) => TransportErrorKind::Tls,
        #[cfg(feature = "tls-rustls")]
        ureq::Error::Rustls(_) => TransportErrorKind::Tls,
        #[cfg(feature = "tls-native")]
        ureq::Error::NativeTls(_) => TransportErrorKind::Tls,
        ureq::Error::ConnectProxyFailed(_) | ureq::Error::ConnectionFailed => {
            TransportErrorKind::Connect
        }
        ureq::Error::Io(source) => match source.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                TransportErrorKind::Read
            }
            std::io::ErrorKind::NotFound => TransportErrorKind::Dns,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::AddrNotAvailable => TransportErrorKind::Connect,
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => TransportErrorKind::Read,
            _ => TransportErrorKind::Other,
        },
        _ => TransportErrorKind::Other,
    }
}

fn wrapped_ureq_error(io_error: &std::io::Error) -> Option<&ureq::Error> {
    io_error
        .get_ref()
        .and_then(|source| source.downcast_ref::<ureq::Error>())
}

enum ReadBodyError {
    Read(std::io::Error),
    TooLarge { actual_bytes: usize },
}

fn read_all_body_limited(
    response: &mut ureq::http::Response<ureq::Body>,
    max_bytes: usize,
) -> Result<Bytes, ReadBodyError> {
    let mut reader = response.body_mut().as_reader();
    let mut collected = Vec::new();
    let mut chunk = [0_u8; 8192];
    let mut total_len = 0_usize;

    loop {
        let read = reader.read(&mut chunk).map_err(ReadBodyError::Read)?;
        if read == 0 {
            break;
        }
        total_len = total_len.saturating_add(read);
        if total_len > max_bytes {
            return Err(ReadBodyError::TooLarge {
                actual_bytes: total_len,
            });
        }
        collected.extend_from_slice(&chunk[..read]);
    }

    Ok(Bytes::from(collected))
}
