use http::Method;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Tls,
    Read,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Read => "read",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeoutPhase {
    Connect,
    Response,
    ResponseBody,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Connect => "connect",
            Self::Response => "response",
            Self::ResponseBody => "response_body",
        };
        formatter.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    InvalidHeaderName,
    InvalidHeaderValue,
    InvalidOption,
    Prepare,
    EmptyHistory,
    Deserialize,
    InvalidUrl,
    InvalidProxy,
    SerializeJson,
    SerializeForm,
    RequestBuild,
    TlsConfig,
    Transport,
    Timeout,
    ReadBody,
    ResponseBodyTooLarge,
    TransportOther,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidHeaderName => "invalid_header_name",
            Self::InvalidHeaderValue => "invalid_header_value",
            Self::InvalidOption => "invalid_option",
            Self::Prepare => "prepare",
            Self::EmptyHistory => "empty_history",
            Self::Deserialize => "deserialize",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidProxy => "invalid_proxy",
            Self::SerializeJson => "serialize_json",
            Self::SerializeForm => "serialize_form",
            Self::RequestBuild => "request_build",
            Self::TlsConfig => "tls_config",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::ReadBody => "read_body",
            Self::ResponseBodyTooLarge => "response_body_too_large",
            Self::TransportOther => "transport_other",
        }
    }
}

/// Failures raised by a [`Transport`](crate::Transport).
///
/// This is the only error family an exception handler intercepts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("invalid request url: {url}")]
    InvalidUrl { url: String },
    #[error("invalid proxy url {proxy}: {source}")]
    InvalidProxy {
        proxy: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to serialize request json: {source}")]
    SerializeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize request form: {source}")]
    SerializeForm {
        #[source]
        source: serde_urlencoded::ser::Error,
    },
    #[error("failed to build http request: {source}")]
    RequestBuild {
        #[source]
        source: http::Error,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("invalid tls configuration for backend {backend}: {message}")]
    TlsConfig {
        backend: &'static str,
        message: String,
    },
    #[error("http transport error ({kind}) for {method} {uri}: {source}")]
    Transport {
        kind: TransportErrorKind,
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("http request timed out in {phase} after {timeout_ms}ms for {method} {uri}")]
    Timeout {
        phase: TimeoutPhase,
        timeout_ms: u128,
        method: Method,
        uri: String,
    },
    #[error("failed to read response body for {method} {uri}: {source}")]
    ReadBody {
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error(
        "response body too large ({actual_bytes} bytes > {limit_bytes} bytes) for {method} {uri}"
    )]
    ResponseBodyTooLarge {
        limit_bytes: usize,
        actual_bytes: usize,
        method: Method,
        uri: String,
    },
    #[error(transparent)]
    Other(BoxError),
}

impl TransportError {
    /// Wraps an error produced by a custom transport.
    pub fn other(source: impl Into<BoxError>) -> Self {
        Self::Other(source.into())
    }

    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            Self::InvalidProxy { .. } => ErrorCode::InvalidProxy,
            Self::SerializeJson { .. } => ErrorCode::SerializeJson,
            Self::SerializeForm { .. } => ErrorCode::SerializeForm,
            Self::RequestBuild { .. } => ErrorCode::RequestBuild,
            Self::InvalidHeaderValue { .. } => ErrorCode::InvalidHeaderValue,
            Self::TlsConfig { .. } => ErrorCode::TlsConfig,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::ReadBody { .. } => ErrorCode::ReadBody,
            Self::ResponseBodyTooLarge { .. } => ErrorCode::ResponseBodyTooLarge,
            Self::Other(_) => ErrorCode::TransportOther,
        }
    }

    pub const fn kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid header name {name}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("invalid value for option {name}: {message}")]
    InvalidOption { name: &'static str, message: String },
    #[error(transparent)]
    Prepare(BoxError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(
        "last_response_body() called with empty history; set history_capacity > 0 and dispatch a request first"
    )]
    EmptyHistory,
    #[error("failed to decode response json: {source}; body={body}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl Error {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidHeaderName { .. } => ErrorCode::InvalidHeaderName,
            Self::InvalidHeaderValue { .. } => ErrorCode::InvalidHeaderValue,
            Self::InvalidOption { .. } => ErrorCode::InvalidOption,
            Self::Prepare(_) => ErrorCode::Prepare,
            Self::Transport(error) => error.code(),
            Self::EmptyHistory => ErrorCode::EmptyHistory,
            Self::Deserialize { .. } => ErrorCode::Deserialize,
        }
    }

    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(error) => Some(error),
            _ => None,
        }
    }

    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidHeaderName { .. }
                | Self::InvalidHeaderValue { .. }
                | Self::InvalidOption { .. }
        )
    }
}
