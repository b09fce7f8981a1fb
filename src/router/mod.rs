//! Request routing — match URL paths against compiled segment patterns and
//! dispatch to handler functions.
//!
//! A route pattern is a slash-separated sequence compiled into one matcher
//! per segment:
//!
//! | Pattern segment | Compiles to          | Accepts             | Captures        |
//! |-----------------|----------------------|---------------------|-----------------|
//! | `users`         | [`LiteralMatcher`]   | exactly `users`     | *(none)*        |
//! | `{id}`          | [`VariableMatcher`]  | any non-empty value | `id → <value>`  |
//! | *(empty)*       | [`WildcardMatcher`]  | anything            | *(none)*        |
//!
//! A trailing `/` therefore ends the sequence with a wildcard, which absorbs
//! any number of remaining path segments (including none): `/files/` matches
//! `/files`, `/files/a`, and `/files/a/b`.
//!
//! Routes are matched in registration order; the first route whose method and
//! pattern both match the incoming request wins. When no route matches, a
//! `404 Not Found` response is returned.

use std::pin::Pin;
use std::sync::Arc;

use crate::context::{Context, Parameters};
use crate::middleware::{Middleware, MiddlewareHandler, Next, from_middleware};
use crate::{Method, Request, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`] and
/// returns a [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and shared
/// across threads without copying the underlying closure. In practice you never
/// construct this type directly — use [`Router::get`], [`Router::post`], and
/// the other method-specific helpers instead.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket
/// impl below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

/// One compiled segment of a route pattern.
///
/// Matchers are immutable once compiled and shared read-only across
/// concurrent dispatches; captured parameters are written into the
/// per-request [`Parameters`] container instead.
pub trait SegmentMatcher: Send + Sync {
    /// Checks whether the path segment satisfies this matcher.
    fn check_match(&self, segment: &str) -> bool;

    /// Appends any parameters extracted from the path segment.
    ///
    /// Only called after [`check_match`](Self::check_match) succeeded.
    /// No-op for matchers that capture nothing.
    fn extract_param(&self, params: &mut Parameters, segment: &str);
}

/// Matches a path segment against fixed text.
pub struct LiteralMatcher {
    literal: String,
}

impl LiteralMatcher {
    /// Creates a matcher accepting exactly `literal`.
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }
}

impl SegmentMatcher for LiteralMatcher {
    fn check_match(&self, segment: &str) -> bool {
        self.literal == segment
    }

    fn extract_param(&self, _params: &mut Parameters, _segment: &str) {}
}

/// Matches any non-empty path segment and captures it as a REST parameter.
pub struct VariableMatcher {
    name: String,
}

impl VariableMatcher {
    /// Creates a matcher capturing segments under the given parameter name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SegmentMatcher for VariableMatcher {
    fn check_match(&self, segment: &str) -> bool {
        !segment.is_empty()
    }

    fn extract_param(&self, params: &mut Parameters, segment: &str) {
        params.push(self.name.clone(), segment);
    }
}

/// Matches every path segment. Compiled from empty pattern segments, which is
/// how a trailing `/` is represented.
pub struct WildcardMatcher;

impl SegmentMatcher for WildcardMatcher {
    fn check_match(&self, _segment: &str) -> bool {
        true
    }

    fn extract_param(&self, _params: &mut Parameters, _segment: &str) {}
}

/// Compiles a route pattern into one matcher per slash-separated segment.
fn compile_pattern(pattern: &str) -> Vec<Box<dyn SegmentMatcher>> {
    pattern
        .split('/')
        .map(|segment| -> Box<dyn SegmentMatcher> {
            if segment.is_empty() {
                Box::new(WildcardMatcher)
            } else if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Box::new(VariableMatcher::new(name))
            } else {
                Box::new(LiteralMatcher::new(segment))
            }
        })
        .collect()
}

// A single registered route binding a method + compiled pattern to a handler.
struct Route {
    method: Method,
    matchers: Vec<Box<dyn SegmentMatcher>>,
    // The pattern ended with '/', so the final matcher absorbs any tail.
    tail_wildcard: bool,
    handler: Handler,
}

impl Route {
    fn new(method: Method, pattern: &str, handler: Handler) -> Self {
        Self {
            method,
            matchers: compile_pattern(pattern),
            tail_wildcard: pattern.ends_with('/'),
            handler,
        }
    }

    // Walks the path's segments against the compiled matchers, collecting
    // captured parameters. `None` when the counts do not align or any
    // matcher rejects its segment.
    fn match_path(&self, path: &str) -> Option<Parameters> {
        let segments: Vec<&str> = path.split('/').collect();

        let fixed = if self.tail_wildcard {
            self.matchers.len() - 1
        } else {
            self.matchers.len()
        };

        if self.tail_wildcard {
            if segments.len() < fixed {
                return None;
            }
        } else if segments.len() != fixed {
            return None;
        }

        let mut params = Parameters::new();
        for (matcher, segment) in self.matchers[..fixed].iter().zip(segments.iter().copied()) {
            if !matcher.check_match(segment) {
                return None;
            }
            matcher.extract_param(&mut params, segment);
        }

        Some(params)
    }
}

/// HTTP request router that dispatches requests to registered handler functions.
///
/// Routes are evaluated in registration order; the first route whose HTTP
/// method and path pattern both match the incoming request is used. Requests
/// flow through any attached middleware before reaching the handler. When no
/// route matches, a `404 Not Found` response is returned automatically.
///
/// # Examples
///
/// ```rust,no_run
/// use platter::context::Context;
/// use platter::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
///
/// router.get("/ping", |_ctx: Context| async { Response::new(StatusCode::Ok) });
///
/// router.get("/users/{id}", |ctx: Context| async move {
///     let id = ctx.params().get("id").unwrap_or("unknown").to_owned();
///     Response::new(StatusCode::Ok).body(id)
/// });
/// ```
pub struct Router {
    routes: Vec<Route>,
    middlewares: Vec<MiddlewareHandler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middlewares: Vec::new(),
        }
    }

    /// Registers a handler for `GET` requests matching `pattern`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use platter::{Router, Response, StatusCode};
    ///
    /// let mut router = Router::new();
    /// router.get("/hello", |_ctx| async { Response::new(StatusCode::Ok) });
    /// ```
    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, pattern, handler);
    }

    /// Registers a handler for `POST` requests matching `pattern`.
    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, pattern, handler);
    }

    /// Registers a handler for `PUT` requests matching `pattern`.
    pub fn put(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Put, pattern, handler);
    }

    /// Registers a handler for `DELETE` requests matching `pattern`.
    pub fn delete(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Delete, pattern, handler);
    }

    /// Registers a handler for `HEAD` requests matching `pattern`.
    pub fn head(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Head, pattern, handler);
    }

    /// Registers a handler for `OPTIONS` requests matching `pattern`.
    pub fn options(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Options, pattern, handler);
    }

    /// Registers a handler for `PATCH` requests matching `pattern`.
    pub fn patch(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Patch, pattern, handler);
    }

    /// Attaches a middleware to the dispatch pipeline.
    ///
    /// Middleware run in attachment order around every matched route's
    /// handler. They do not run for requests that fall through to the 404
    /// response.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(from_middleware(Arc::new(middleware)));
    }

    // Erase the concrete handler type and store it as a `Handler` trait object.
    fn add_route(&mut self, method: Method, pattern: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route::new(method, pattern, handler));
    }

    /// Returns the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatches `request` to the first matching route and returns its response.
    ///
    /// Captured REST parameters are attached to the request before the
    /// middleware chain and handler run. If no route matches, a `404 Not
    /// Found` response is returned.
    pub async fn route(&self, mut request: Request) -> Response {
        for route in &self.routes {
            if route.method != request.method() {
                continue;
            }
            let Some(params) = route.match_path(request.path()) else {
                continue;
            };

            *request.params_mut() = params;
            let ctx = Context::new(request);

            let handler = Arc::clone(&route.handler);
            let mut chain = self.middlewares.clone();
            chain.push(Arc::new(move |ctx: Context, _next: Next| handler(ctx)));
            return Next::new(chain).run(ctx).await;
        }

        Response::new(StatusCode::NotFound)
    }
}
