//! Binding between the [`Router`](crate::Router) and the endpoint
//! capabilities.
//!
//! The rest of the pipeline sees only [`RouteParams`] and
//! [`RequestContext`]. This module is the one place that knows the router
//! captures parameters with matchit and that the server tags requests with
//! their peer address.
//!
//! ```rust
//! use http::StatusCode;
//! use tsu_endpoint::{Input, Output, Router, binding};
//!
//! fn get_clip(input: &mut Input<'_>) -> Option<Output> {
//!     let id = input.params().require("id");
//!     Some(Output::new(StatusCode::OK).with_data(format!("clip {id}")))
//! }
//!
//! let control = binding::control();
//! let app = Router::new().get("/clips/{id}", control.handler(get_clip));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use crate::control::Control;
use crate::endpoint::{ContextExt, Input, Key, RequestContext, RouteParams};
use crate::hooks::{content_type_finalize, payload_bytes};
use crate::server::RemoteAddr;

/// Peer address of the connection, when the request came through a
/// [`Server`](crate::Server).
pub const REMOTE_ADDR: Key<SocketAddr> = Key::new("remote_addr");

/// Path parameters captured by matchit for the matched route.
#[derive(Clone, Debug, Default)]
pub struct MatchitParams(HashMap<String, String>);

impl MatchitParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

impl RouteParams for MatchitParams {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn require(&self, key: &str) -> &str {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key missing from MatchitParams: {key}"),
        }
    }
}

/// Request-lifetime value store.
#[derive(Default)]
pub struct ContextStore {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestContext for ContextStore {
    fn get_value(&self, name: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(name).map(|v| &**v)
    }

    fn set_value(&mut self, name: &'static str, value: Box<dyn Any + Send + Sync>) {
        self.values.insert(name, value);
    }
}

impl fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Initialize hook: installs [`MatchitParams`] and a fresh [`ContextStore`].
pub fn initialize(input: &mut Input<'_>) {
    let request = input.request();
    let params = MatchitParams::new(request.params().clone());

    let mut context = ContextStore::new();
    if let Some(RemoteAddr(addr)) = request.extensions().get::<RemoteAddr>() {
        context.set(REMOTE_ADDR, *addr);
    }

    input.route_params = Some(Box::new(params));
    input.context = Some(Box::new(context));
}

/// A [`Control`] wired to this binding, deriving `content-type` and body
/// from the payload (see [`hooks`](crate::hooks)).
pub fn control() -> Control {
    Control::new(initialize, content_type_finalize, payload_bytes)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::endpoint::Output;
    use crate::request::Request;

    const USER: Key<String> = Key::new("user");

    fn request_with(params: &[(&str, &str)], remote: Option<SocketAddr>) -> Request {
        let mut builder = http::Request::builder().uri("/clips/42");
        if let Some(addr) = remote {
            builder = builder.extension(RemoteAddr(addr));
        }
        let (parts, body) = builder.body(Bytes::new()).unwrap().into_parts();
        let params = params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Request::new(parts, body, params)
    }

    fn show(input: &mut Input<'_>) -> Option<Output> {
        let id = input.params().require("id").to_owned();
        input.context_mut().set(USER, "alice".to_owned());
        let user = input.context().require(USER);
        let peer = input.context().get(REMOTE_ADDR).map(|a| a.to_string());
        Some(Output::new(StatusCode::OK).with_data(format!("{id} {user} {peer:?}")))
    }

    fn missing(input: &mut Input<'_>) -> Option<Output> {
        input.params().require("missing");
        Some(Output::new(StatusCode::OK))
    }

    #[test]
    fn params_and_context_reach_the_endpoint() {
        let addr: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let res = control().respond(&show, request_with(&[("id", "42")], Some(addr)));

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(res.body().as_ref(), br#"42 alice Some("10.0.0.1:5555")"#);
    }

    #[test]
    fn remote_addr_absent_without_server() {
        let res = control().respond(&show, request_with(&[("id", "7")], None));
        assert_eq!(res.body().as_ref(), b"7 alice None");
    }

    #[test]
    #[should_panic(expected = "key missing from MatchitParams: missing")]
    fn missing_param_is_fatal() {
        control().respond(&missing, request_with(&[("id", "42")], None));
    }

    #[test]
    fn store_round_trip() {
        let mut store = ContextStore::new();
        store.set(USER, "bob".to_owned());
        assert_eq!(store.require(USER), "bob");
        assert_eq!(store.get(REMOTE_ADDR), None);
    }
}
