//! # tsu-endpoint
//!
//! HTTP endpoints as plain functions, independent of the router that
//! serves them.
//!
//! ## The contract
//!
//! An endpoint takes an [`Input`] and returns an optional [`Output`]:
//!
//! ```text
//! fn name(input: &mut Input<'_>) -> Option<Output>
//! ```
//!
//! A [`Control`] wraps endpoints into router handlers. It holds three hooks
//! and runs them around every call, in this order:
//!
//! - **initialize** prepares the input: route params, request context
//! - **finalize** adjusts the output, e.g. headers derived from the payload
//! - **bytes** serializes the payload into the response body
//!
//! then writes headers, status and body. An endpoint that returns `None`
//! has written the response itself through [`Input::writer`], and the
//! pipeline stays out of the way.
//!
//! Endpoints never see matchit or hyper. The [`binding`] module supplies
//! the [`RouteParams`] and [`RequestContext`] implementations for this
//! crate's [`Router`]; a different router only needs a different
//! initialize hook.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use serde_json::json;
//! use tsu_endpoint::{Input, Output, Router, Server, binding};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tsu_endpoint::Error> {
//!     let control = binding::control();
//!     let app = Router::new()
//!         .get("/users/{id}", control.handler(get_user))
//!         .delete("/users/{id}", control.handler(delete_user));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! fn get_user(input: &mut Input<'_>) -> Option<Output> {
//!     let id = input.params().require("id");
//!     Some(Output::new(StatusCode::OK).with_data(json!({ "id": id })))
//! }
//!
//! fn delete_user(_input: &mut Input<'_>) -> Option<Output> {
//!     Some(Output::new(StatusCode::NO_CONTENT))
//! }
//! ```

mod control;
mod endpoint;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod writer;

pub mod binding;
pub mod hooks;

pub use control::{Byter, Control, Finalizer, Initializer};
pub use endpoint::{ContextExt, Endpoint, Input, Key, Output, RequestContext, RouteParams};
pub use error::Error;
pub use handler::{EndpointHandler, Handler};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::{RemoteAddr, Server};
pub use writer::{ResponseBuffer, ResponseWriter};
