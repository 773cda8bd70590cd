use std::fmt;
use std::io::{Cursor, Read};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::util::truncate_body;

enum ResponseBody {
    Buffered(Bytes),
    Streaming(Box<dyn Read + Send>),
}

/// A response returned by a transport, or the fallback produced by an exception handler.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Option<String>,
    body: ResponseBody,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            url: None,
            body: ResponseBody::Buffered(body.into()),
        }
    }

    pub fn streaming<R>(status: StatusCode, headers: HeaderMap, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            status,
            headers,
            url: None,
            body: ResponseBody::Streaming(Box::new(reader)),
        }
    }

    /// A bodyless response with the given status, handy as a handler fallback.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::new())
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Streaming(_))
    }

    /// The buffered body. Empty for streaming responses; use [`Response::into_reader`].
    pub fn body(&self) -> &[u8] {
        match &self.body {
            ResponseBody::Buffered(body) => body,
            ResponseBody::Streaming(_) => &[],
        }
    }

    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }

    pub fn json<T>(&self) -> crate::Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(self.body()).map_err(|source| Error::Deserialize {
            source,
            body: truncate_body(self.body()),
        })
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self.body {
            ResponseBody::Buffered(body) => Box::new(Cursor::new(body)),
            ResponseBody::Streaming(reader) => reader,
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = formatter.debug_struct("Response");
        debug
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("url", &self.url);
        match &self.body {
            ResponseBody::Buffered(body) => debug.field("body_len", &body.len()),
            ResponseBody::Streaming(_) => debug.field("body", &"<streaming>"),
        };
        debug.finish()
    }
}
