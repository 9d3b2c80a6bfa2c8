//! Request ID middleware for request tracing and correlation.
//!
//! Reuses an `x-request-id` set by an upstream proxy when it is short and
//! printable, otherwise generates a UUID v4. The ID is recorded on the
//! request span, tagged on the Sentry scope, stored in the request
//! extensions as [`RequestId`], and echoed in the response headers.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID that is accepted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// The ID of the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id =
        incoming_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// The upstream request ID, if present and usable.
fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();

    let usable = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());

    usable.then(|| value.to_owned())
}
