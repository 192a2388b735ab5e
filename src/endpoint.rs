//! The endpoint contract: what a handler sees and what it hands back.
//!
//! An endpoint is a plain function:
//!
//! ```text
//! fn name(input: &mut Input<'_>) -> Option<Output>
//! ```
//!
//! It never touches the router it runs under. Path parameters and
//! request-scoped values reach it through two capability traits,
//! [`RouteParams`] and [`RequestContext`], which a router binding installs
//! before the endpoint runs. Returning `None` means the endpoint already
//! wrote the whole response through [`Input::writer`].

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use http::StatusCode;

use crate::request::Request;
use crate::writer::ResponseWriter;

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Read access to the named path parameters of the matched route.
pub trait RouteParams {
    fn get(&self, key: &str) -> Option<&str>;

    /// Returns the parameter the route is known to define.
    ///
    /// # Panics
    ///
    /// Panics if `key` is absent. A missing parameter means the endpoint
    /// was mounted on a route that does not capture it.
    fn require(&self, key: &str) -> &str {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key missing from route params: {key}"),
        }
    }
}

/// Request-scoped key/value store shared by the pipeline hooks and the
/// endpoint.
///
/// This is the object-safe half. Typed access goes through [`Key`] and
/// the [`ContextExt`] methods, which every implementor gets for free.
pub trait RequestContext {
    fn get_value(&self, name: &str) -> Option<&(dyn Any + Send + Sync)>;
    fn set_value(&mut self, name: &'static str, value: Box<dyn Any + Send + Sync>);
}

/// A typed token naming one value in a [`RequestContext`].
///
/// ```rust
/// use tsu_endpoint::Key;
///
/// struct User { name: String }
/// const USER: Key<User> = Key::new("user");
/// ```
pub struct Key<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, _type: PhantomData }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self { *self }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.name)
    }
}

/// Typed accessors over any [`RequestContext`], including `dyn RequestContext`.
pub trait ContextExt: RequestContext {
    fn get<T: Any>(&self, key: Key<T>) -> Option<&T> {
        self.get_value(key.name)?.downcast_ref()
    }

    /// # Panics
    ///
    /// Panics if nothing is stored under `key`, or if the stored value is
    /// not a `T`. Either way an earlier stage broke its contract.
    fn require<T: Any>(&self, key: Key<T>) -> &T {
        let Some(value) = self.get_value(key.name) else {
            panic!("key missing from request context: {}", key.name);
        };
        match value.downcast_ref() {
            Some(value) => value,
            None => panic!(
                "context key `{}` holds a value that is not a {}",
                key.name,
                std::any::type_name::<T>(),
            ),
        }
    }

    fn set<T: Any + Send + Sync>(&mut self, key: Key<T>, value: T) {
        self.set_value(key.name, Box::new(value));
    }
}

impl<C: RequestContext + ?Sized> ContextExt for C {}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Everything an endpoint can see about the request in flight.
///
/// Built fresh for each request with both capabilities unset; the
/// control's initialize hook fills them in.
pub struct Input<'w> {
    writer: &'w mut dyn ResponseWriter,
    request: Request,
    /// URL-routing parameters, like `id` in `/clips/{id}`.
    pub route_params: Option<Box<dyn RouteParams>>,
    /// Values passed between the hooks and the endpoint.
    pub context: Option<Box<dyn RequestContext>>,
}

impl<'w> Input<'w> {
    pub fn new(writer: &'w mut dyn ResponseWriter, request: Request) -> Self {
        Self { writer, request, route_params: None, context: None }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The raw response sink. An endpoint that writes here should return
    /// `None` so the pipeline leaves the response alone.
    pub fn writer(&mut self) -> &mut (dyn ResponseWriter + 'w) {
        &mut *self.writer
    }

    /// # Panics
    ///
    /// Panics if no initialize hook installed route params.
    pub fn params(&self) -> &dyn RouteParams {
        match &self.route_params {
            Some(params) => params.as_ref(),
            None => panic!("route params were never initialized for {}", self.request.path()),
        }
    }

    /// # Panics
    ///
    /// Panics if no initialize hook installed a context.
    pub fn context(&self) -> &dyn RequestContext {
        match &self.context {
            Some(context) => context.as_ref(),
            None => panic!("request context was never initialized for {}", self.request.path()),
        }
    }

    /// # Panics
    ///
    /// Panics if no initialize hook installed a context.
    pub fn context_mut(&mut self) -> &mut dyn RequestContext {
        match &mut self.context {
            Some(context) => context.as_mut(),
            None => panic!("request context was never initialized for {}", self.request.path()),
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// An endpoint's result: status, custom headers, and an opaque payload the
/// control's bytes hook knows how to serialize.
pub struct Output {
    pub status: StatusCode,
    /// Empty means no custom headers.
    pub headers: Vec<(String, String)>,
    pub data: Option<Box<dyn Any + Send>>,
}

impl Output {
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), data: None }
    }

    /// Builder form of [`set_header`](Output::set_header).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_data<T: Any + Send>(mut self, data: T) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    /// Sets a header, replacing an existing entry with the same name
    /// (compared case-insensitively).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The payload, if there is one and it is a `T`.
    pub fn data_ref<T: Any>(&self) -> Option<&T> {
        self.data.as_ref()?.downcast_ref()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("data", &self.data.as_ref().map(|_| "..."))
            .finish()
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// A request handler that knows nothing about the router or server.
///
/// Any `fn` item or closure with this shape coerces to `&Endpoint`.
pub type Endpoint<'a> = dyn for<'i, 'w> Fn(&'i mut Input<'w>) -> Option<Output> + 'a;
