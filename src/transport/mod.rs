use std::sync::Arc;

use http::Method;

use crate::error::TransportError;
use crate::options::RequestOptions;
use crate::response::Response;

mod blocking;

pub use blocking::{UreqTransport, UreqTransportBuilder};

/// Performs the network call for a dispatcher.
///
/// `options` are the merged options for the call. Implementations own connection
/// handling, timeouts, redirects and body serialization.
pub trait Transport: Send + Sync {
    fn call(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn call(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        (**self).call(method, url, options)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        (**self).call(method, url, options)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn call(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        (**self).call(method, url, options)
    }
}
