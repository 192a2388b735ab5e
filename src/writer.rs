//! The response sink endpoints and the pipeline write through.
//!
//! # Write order
//!
//! An HTTP response is emitted head first: headers and status line, then
//! the body. Once the head is out, headers can no longer change. Every
//! [`ResponseWriter`] enforces the same order:
//!
//! ```text
//! set_header* → write_head → write_body*
//! ```
//!
//! `write_body` before `write_head` implies `200 OK`, matching what most
//! server runtimes do.

use bytes::BytesMut;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::error::Error;
use crate::response::Response;

/// A writable HTTP response.
pub trait ResponseWriter {
    /// Sets a header, replacing any previous value under the same name.
    ///
    /// Fails with [`Error::HeadersSent`] once the head has been written.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error>;

    /// Writes the status line. Allowed once.
    fn write_head(&mut self, status: StatusCode) -> Result<(), Error>;

    /// Appends a chunk to the body.
    fn write_body(&mut self, chunk: &[u8]) -> Result<(), Error>;
}

/// In-memory [`ResponseWriter`] that becomes a [`Response`].
///
/// One buffer is allocated per request by
/// [`Control::handler`](crate::Control::handler).
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    headers: HeaderMap,
    status: Option<StatusCode>,
    body: BytesMut,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once `write_head` (or an implicit one) has happened.
    pub fn head_written(&self) -> bool {
        self.status.is_some()
    }

    /// Finishes the response. A buffer nobody wrote to is an empty `200 OK`.
    pub fn into_response(self) -> Response {
        Response {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: self.headers,
            body: self.body.freeze(),
        }
    }
}

impl ResponseWriter for ResponseBuffer {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        if self.head_written() {
            return Err(Error::HeadersSent);
        }
        let invalid = || Error::InvalidHeader { name: name.to_owned() };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        // obs-text is allowed, control characters are not
        let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| invalid())?;
        self.headers.insert(name, value);
        Ok(())
    }

    fn write_head(&mut self, status: StatusCode) -> Result<(), Error> {
        if self.head_written() {
            return Err(Error::HeadersSent);
        }
        self.status = Some(status);
        Ok(())
    }

    fn write_body(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}
