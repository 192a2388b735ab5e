//! The two kinds of handler a [`Router`](crate::Router) serves.
//!
//! ```text
//! control.handler(get_user)       ← EndpointHandler: sync pipeline pass
//! async fn healthz(req: Request)  ← AsyncHandler: awaited future
//!        ↓ Router::on(method, path, handler)
//! Arc<dyn ErasedHandler>          ← BoxedHandler, one per route
//!        ↓ per request
//! handler.call(req) -> Dispatch   ← Ready(response) | Pending(future)
//! ```
//!
//! Endpoints run to completion inside `call`, so their responses come back
//! as [`Dispatch::Ready`] and nothing is boxed per request. Only async
//! handlers pay for a boxed future.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::control::Control;
use crate::endpoint::{Input, Output};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// What a handler produced for one request.
#[doc(hidden)]
pub enum Dispatch {
    /// The response is already built.
    Ready(Response),
    /// The handler is still running.
    Pending(BoxFuture),
}

impl Dispatch {
    pub(crate) async fn resolve(self) -> Response {
        match self {
            Dispatch::Ready(response) => response,
            Dispatch::Pending(fut) => fut.await,
        }
    }
}

/// Object-safe face of a route's handler.
///
/// `#[doc(hidden)] pub` because it shows up in the return type of
/// [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> Dispatch;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Anything the [`Router`](crate::Router) can dispatch to: an
/// [`EndpointHandler`] from [`Control::handler`], or any
/// `async fn(Request) -> impl IntoResponse`. Sealed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// An endpoint bound to the [`Control`] that runs it.
///
/// Built by [`Control::handler`]. Each request gets its own
/// [`ResponseBuffer`](crate::ResponseBuffer).
pub struct EndpointHandler<E> {
    control: Control,
    endpoint: E,
}

impl<E> EndpointHandler<E>
where
    E: Fn(&mut Input<'_>) -> Option<Output> + Send + Sync + 'static,
{
    pub(crate) fn new(control: Control, endpoint: E) -> Self {
        Self { control, endpoint }
    }
}

impl<E> fmt::Debug for EndpointHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointHandler")
            .field("endpoint", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}

impl<E> ErasedHandler for EndpointHandler<E>
where
    E: Fn(&mut Input<'_>) -> Option<Output> + Send + Sync + 'static,
{
    fn call(&self, req: Request) -> Dispatch {
        Dispatch::Ready(self.control.respond(&self.endpoint, req))
    }
}

impl<E> private::Sealed for EndpointHandler<E> where
    E: Fn(&mut Input<'_>) -> Option<Output> + Send + Sync + 'static
{
}

impl<E> Handler for EndpointHandler<E>
where
    E: Fn(&mut Input<'_>) -> Option<Output> + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

// ── Plain async handlers ──────────────────────────────────────────────────────

struct AsyncHandler<F>(F);

impl<F, Fut, R> ErasedHandler for AsyncHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> Dispatch {
        let fut = (self.0)(req);
        Dispatch::Pending(Box::pin(async move { fut.await.into_response() }))
    }
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(AsyncHandler(self))
    }
}
