//! Common HTTP types shared by middleware, handlers and the server.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

/// The HTTP request type flowing through a route chain.
///
/// This is a standard `http::Request` with a fully buffered `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by a route chain.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future, as used by guards, middleware and handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Extension trait for building responses without fallible builders.
pub trait ResponseExt {
    /// Creates a response with the given status and an empty body.
    fn empty(status: StatusCode) -> Response;

    /// Creates a `text/plain` response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;

    /// Creates a `text/html` response.
    fn html(status: StatusCode, body: impl Into<String>) -> Response;

    /// Creates an `application/json` response.
    ///
    /// If the value cannot be serialized the response degrades to an empty 500.
    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response;
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

impl ResponseExt for Response {
    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        with_body(status, "text/plain; charset=utf-8", Bytes::from(body.into()))
    }

    fn html(status: StatusCode, body: impl Into<String>) -> Response {
        with_body(status, "text/html; charset=utf-8", Bytes::from(body.into()))
    }

    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(bytes) => with_body(status, "application/json", Bytes::from(bytes)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response body");
                Self::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
