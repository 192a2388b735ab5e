//! The control pipeline: turns an [`Endpoint`] into a native handler.
//!
//! Each request makes one synchronous pass:
//!
//! ```text
//! Input::new(writer, request)
//!        ↓ initialize(&mut input)      ← router binding fills params/context
//! endpoint(&mut input)
//!        ↓ None → stop, the endpoint wrote the response itself
//! finalize(&mut output)                ← derive headers from the payload
//!        ↓
//! bytes(&output)                       ← serialize the payload
//!        ↓
//! set_header* → write_head → write_body
//! ```
//!
//! Header writes must precede the status line, and the status line must
//! precede the body; a [`ResponseWriter`] rejects anything else.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::endpoint::{Endpoint, Input, Output};
use crate::handler::EndpointHandler;
use crate::hooks::{null_bytes, null_finalize, null_initialize};
use crate::request::Request;
use crate::response::Response;
use crate::writer::{ResponseBuffer, ResponseWriter};

/// Prepares the [`Input`] before the endpoint runs.
pub type Initializer = Arc<dyn for<'i, 'w> Fn(&'i mut Input<'w>) + Send + Sync>;

/// Adjusts the [`Output`] after the endpoint runs.
pub type Finalizer = Arc<dyn Fn(&mut Output) + Send + Sync>;

/// Serializes `Output::data` into the response body.
pub type Byter = Arc<dyn Fn(&Output) -> Bytes + Send + Sync>;

/// Three hooks shared by a family of endpoints.
///
/// Built once at startup. Cloning is three `Arc` increments, and nothing in
/// a `Control` changes per request.
#[derive(Clone)]
pub struct Control {
    initialize: Initializer,
    finalize: Finalizer,
    bytes: Byter,
}

impl Control {
    pub fn new<I, F, B>(initialize: I, finalize: F, bytes: B) -> Self
    where
        I: Fn(&mut Input<'_>) + Send + Sync + 'static,
        F: Fn(&mut Output) + Send + Sync + 'static,
        B: Fn(&Output) -> Bytes + Send + Sync + 'static,
    {
        Self {
            initialize: Arc::new(initialize),
            finalize: Arc::new(finalize),
            bytes: Arc::new(bytes),
        }
    }

    /// Wraps `endpoint` into a handler for [`Router::on`](crate::Router::on).
    ///
    /// ```rust
    /// use http::{Method, StatusCode};
    /// use tsu_endpoint::{Control, Output, Router};
    ///
    /// let control = Control::default();
    /// let app = Router::new().on(
    ///     Method::GET,
    ///     "/ping",
    ///     control.handler(|_input| Some(Output::new(StatusCode::NO_CONTENT))),
    /// );
    /// ```
    pub fn handler<E>(&self, endpoint: E) -> EndpointHandler<E>
    where
        E: Fn(&mut Input<'_>) -> Option<Output> + Send + Sync + 'static,
    {
        EndpointHandler::new(self.clone(), endpoint)
    }

    /// Runs the pipeline into a fresh [`ResponseBuffer`].
    pub fn respond(&self, endpoint: &Endpoint<'_>, request: Request) -> Response {
        let mut buffer = ResponseBuffer::new();
        self.run(endpoint, &mut buffer, request);
        buffer.into_response()
    }

    /// Runs the pipeline once against an arbitrary sink.
    ///
    /// Never fails: a write the sink refuses is logged and dropped.
    pub fn run(&self, endpoint: &Endpoint<'_>, writer: &mut dyn ResponseWriter, request: Request) {
        let mut input = Input::new(writer, request);
        (self.initialize)(&mut input);

        let Some(mut output) = endpoint(&mut input) else {
            trace!(path = input.request().path(), "endpoint wrote its own response");
            return;
        };

        (self.finalize)(&mut output);
        let body = (self.bytes)(&output);

        let writer = input.writer();
        for (name, value) in &output.headers {
            if let Err(e) = writer.set_header(name, value) {
                warn!(header = %name, error = %e, "dropping response header");
            }
        }
        if let Err(e) = writer.write_head(output.status) {
            warn!(status = %output.status, error = %e, "status not written");
        }
        if let Err(e) = writer.write_body(&body) {
            warn!(len = body.len(), error = %e, "body not written");
        }

        debug!(status = %output.status, len = body.len(), "endpoint responded");
    }
}

/// All three hooks are no-ops; the body is always empty.
impl Default for Control {
    fn default() -> Self {
        Self::new(null_initialize, null_finalize, null_bytes)
    }
}
