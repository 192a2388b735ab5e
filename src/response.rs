//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Endpoints wrapped by a [`Control`](crate::Control) never build a
//! [`Response`] directly: the pipeline fills a
//! [`ResponseBuffer`](crate::ResponseBuffer) and converts it. Plain async
//! handlers registered on the [`Router`](crate::Router) return one.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response, fully buffered.
///
/// ```rust
/// use tsu_endpoint::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// Response::bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::bytes(ContentType::Json, body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::bytes(ContentType::Text, body)
    }

    /// `200 OK` with an explicit content type.
    pub fn bytes(content_type: ContentType, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        Self { status: StatusCode::OK, headers, body: body.into() }
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Converts into the hyper-facing response type.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from router handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a bare status from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_set_content_type() {
        let res = Response::json(br#"{"id":1}"#.to_vec());
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

        let res = "hi".into_response();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(res.body().as_ref(), b"hi");
    }

    #[test]
    fn status_has_no_body_or_headers() {
        let res = StatusCode::NO_CONTENT.into_response();
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.headers().is_empty());
        assert!(res.body().is_empty());
    }

    #[test]
    fn into_inner_keeps_status_and_headers() {
        let inner = Response::bytes(ContentType::Xml, "<ok/>").into_inner();
        assert_eq!(inner.status(), StatusCode::OK);
        assert_eq!(inner.headers()[header::CONTENT_TYPE], "application/xml");
    }
}
