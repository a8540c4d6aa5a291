//! Route definitions and the route table.
//!
//! # Responsibilities
//! - Classify routes by repository action
//! - Parse path patterns once, at registration
//! - Hold routes in registration order (which is match priority)
//!
//! # Design Decisions
//! - `:repo` is reserved: it marks the namespace slot whose width is the configured depth
//! - Handlers are type-erased so the table can mix system and repository routes

use std::fmt;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;

/// Parameter name bound by the namespace slot of repository routes.
pub const NAMESPACE_PARAM: &str = "repo";

/// What a route does, as far as access control is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read from the chart repository.
    RepoPull,
    /// Write to (or delete from) the chart repository.
    RepoPush,
    /// Health and metadata endpoints.
    SystemInfo,
}

impl Action {
    /// Whether requests for this action must pass the authorization engine.
    pub fn requires_authorization(self) -> bool {
        match self {
            Action::RepoPull | Action::RepoPush => true,
            Action::SystemInfo => false,
        }
    }

    /// Scope name used in bearer token access claims.
    pub fn scope(self) -> &'static str {
        match self {
            Action::RepoPull => "pull",
            Action::RepoPush => "push",
            Action::SystemInfo => "sysinfo",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scope())
    }
}

/// One bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    name: String,
    value: String,
    /// Path segments the value was taken from, indexed over the whole request path.
    span: Option<Range<usize>>,
}

/// Ordered path parameter bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Binding>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Binding {
            name: name.into(),
            value: value.into(),
            span: None,
        });
    }

    /// Bind `name` and remember which request path segments it came from.
    pub fn push_at(&mut self, name: impl Into<String>, value: impl Into<String>, span: Range<usize>) {
        self.0.push(Binding {
            name: name.into(),
            value: value.into(),
            span: Some(span),
        });
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.value.as_str())
    }

    /// Repository namespace bound by the route, empty when depth is zero.
    pub fn repo(&self) -> &str {
        self.get(NAMESPACE_PARAM).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|b| (b.name.as_str(), b.value.as_str()))
    }

    /// Bindings that carry their segment positions, as `(name, span)`.
    pub fn spans(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.0
            .iter()
            .filter_map(|b| b.span.clone().map(|span| (b.name.as_str(), span)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a handler receives: the bound parameters and the request itself.
pub struct RouteRequest {
    pub params: Params,
    pub request: Request<Body>,
}

type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Type-erased async route handler.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(RouteRequest) -> HandlerFuture + Send + Sync>);

impl Handler {
    /// Wrap an async function as a route handler.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |req| Box::pin(f(req)) as HandlerFuture))
    }

    pub async fn call(&self, req: RouteRequest) -> Response {
        (self.0)(req).await
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// One segment of a compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    /// Consumes `depth` request segments as the repository namespace.
    Namespace,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(NAMESPACE_PARAM) => Segment::Namespace,
            Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
            _ => Segment::Literal(raw.to_string()),
        }
    }
}

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    action: Action,
    handler: Handler,
}

impl Route {
    pub fn new(method: Method, pattern: impl Into<String>, action: Action, handler: Handler) -> Self {
        let pattern = pattern.into();
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect();
        Self {
            method,
            pattern,
            segments,
            action,
            handler,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Whether the route carries the namespace slot.
    pub fn is_namespaced(&self) -> bool {
        self.segments.contains(&Segment::Namespace)
    }
}

/// Ordered set of routes. Earlier registrations win.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route) -> &mut Self {
        self.routes.push(route);
        self
    }

    /// Builder-style registration.
    pub fn route(mut self, method: Method, pattern: &str, action: Action, handler: Handler) -> Self {
        self.routes.push(Route::new(method, pattern, action, handler));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
