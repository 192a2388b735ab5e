//! Route table over `matchit`.
//!
//! One radix tree per HTTP method. Matching is matchit's job; this module
//! registers handlers, hands captured parameters to the [`Request`], and
//! answers `404` when nothing matches.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use matchit::Router as MatchitRouter;
use tracing::{debug, warn};

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup and pass it to
/// [`Server::serve`](crate::Server::serve). Registration methods return
/// `self` so calls chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    body_limit: usize,
}

impl Router {
    /// Request bodies larger than this get `413` unless
    /// [`body_limit`](Router::body_limit) says otherwise.
    pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

    pub fn new() -> Self {
        Self { routes: HashMap::new(), body_limit: Self::DEFAULT_BODY_LIMIT }
    }

    /// Caps how many body bytes are buffered per request.
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax and reach endpoints through
    /// [`RouteParams`](crate::RouteParams) once the binding's initializer
    /// has run.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid matchit route or conflicts with one
    /// already registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Routes one request and produces one response.
    ///
    /// The body is read in full before the handler runs: `413` if it
    /// exceeds the body limit, `400` if it cannot be read. Also the entry
    /// point for exercising a whole app in tests without a socket.
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();

        let Some((handler, params)) = self.lookup(&parts.method, parts.uri.path()) else {
            debug!(method = %parts.method, path = parts.uri.path(), "no route");
            return Response::status(StatusCode::NOT_FOUND);
        };

        let body = match Limited::new(body, self.body_limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                warn!(path = parts.uri.path(), limit = self.body_limit, "request body too large");
                return Response::status(StatusCode::PAYLOAD_TOO_LARGE);
            }
            Err(e) => {
                warn!(path = parts.uri.path(), error = %e, "failed to read request body");
                return Response::status(StatusCode::BAD_REQUEST);
            }
        };

        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();
        let response = handler.call(Request::new(parts, body, params)).resolve().await;
        debug!(%method, %path, status = %response.status_code(), "request handled");
        response
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
