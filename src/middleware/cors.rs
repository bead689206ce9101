use std::time::Duration;

use http::Method;

use super::Middleware;
use crate::pipeline::{HandlerRequest, HandlerResponse};

/// CORS (Cross-Origin Resource Sharing) response-decoration middleware.
///
/// Wraps a downstream handler and conditionally adds CORS headers to its
/// response based on a fixed policy: allowed origins, methods, headers,
/// exposed headers, preflight max age, and credential support.
///
/// # Decision
///
/// The downstream handler always runs first. The response is then decorated
/// only when the origin gate passes: with a wildcard policy (first allowed
/// origin is `*`) every request passes; otherwise the request must carry an
/// `Origin` header whose value is a member of the allow-list. A request that
/// fails the gate gets the handler's response back byte-for-byte, with no
/// CORS headers at all.
///
/// List values are emitted comma-joined in configured order. No validation
/// is performed on configuration: empty lists, unusual header names, and
/// non-positive max ages are accepted verbatim (a non-positive max age simply
/// omits the `Access-Control-Max-Age` header).
///
/// # Usage
///
/// ```
/// use corsgate::CorsMiddleware;
///
/// let cors = CorsMiddleware::new()
///     .allowed_origins(vec!["https://app.example".into()])
///     .allowed_methods(vec!["GET".into(), "POST".into()])
///     .exposed_headers(vec!["X-Total-Count".into()])
///     .max_age(3600)
///     .supports_credentials(true);
/// ```
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
    exposed_headers: Vec<String>,
    max_age: i64,
    supports_credentials: bool,
}

/// Permissive defaults: any origin, any method, any header, nothing exposed,
/// no preflight caching, no credentials.
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_methods: vec!["*".into()],
            allowed_headers: vec!["*".into()],
            exposed_headers: vec![],
            max_age: 0,
            supports_credentials: false,
        }
    }
}

impl CorsMiddleware {
    /// Create a middleware with the permissive default policy.
    ///
    /// Tighten it with the fluent setters; each one replaces the prior value
    /// wholesale.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the origins permitted to access the resource.
    ///
    /// `["*"]` (or any list whose first element is `*`) allows every origin
    /// and advertises `*` instead of echoing the request origin.
    #[must_use]
    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Set the methods advertised in `Access-Control-Allow-Methods`.
    #[must_use]
    pub fn allowed_methods(mut self, methods: Vec<String>) -> Self {
        self.allowed_methods = methods;
        self
    }

    /// Set the headers advertised in `Access-Control-Allow-Headers`.
    #[must_use]
    pub fn allowed_headers(mut self, headers: Vec<String>) -> Self {
        self.allowed_headers = headers;
        self
    }

    /// Set the headers advertised in `Access-Control-Expose-Headers`.
    ///
    /// An empty list (the default) omits the header entirely.
    #[must_use]
    pub fn exposed_headers(mut self, headers: Vec<String>) -> Self {
        self.exposed_headers = headers;
        self
    }

    /// Set the `Access-Control-Max-Age` value in seconds.
    ///
    /// Values ≤ 0 omit the header.
    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    /// Enable or disable `Access-Control-Allow-Credentials: true`.
    #[must_use]
    pub fn supports_credentials(mut self, supports: bool) -> Self {
        self.supports_credentials = supports;
        self
    }

    /// Run `next` and decorate its response.
    ///
    /// This is the standalone form of the middleware for callers not using a
    /// [`Pipeline`](crate::pipeline::Pipeline). The handler always runs; an
    /// `Err` from it propagates unmodified and no decoration happens.
    pub fn process<F, E>(&self, req: &HandlerRequest, next: F) -> Result<HandlerResponse, E>
    where
        F: FnOnce(&HandlerRequest) -> Result<HandlerResponse, E>,
    {
        let mut res = next(req)?;
        self.apply(req.get_header("origin").unwrap_or(""), &req.method, &mut res);
        Ok(res)
    }

    /// Origin gate plus header decoration.
    ///
    /// The request method is accepted for interface parity but plays no part
    /// in the decision; there is no per-method filtering.
    fn apply(&self, origin: &str, _method: &Method, res: &mut HandlerResponse) {
        let wildcard = self.allowed_origins.first().map(String::as_str) == Some("*");
        if !wildcard && (origin.is_empty() || !self.allowed_origins.iter().any(|o| o == origin)) {
            return;
        }

        let allow_origin = if wildcard { "*" } else { origin };
        res.set_header("access-control-allow-origin", allow_origin.to_string());
        res.set_header("access-control-allow-headers", self.allowed_headers.join(","));
        res.set_header("access-control-allow-methods", self.allowed_methods.join(","));
        if !self.exposed_headers.is_empty() {
            res.set_header(
                "access-control-expose-headers",
                self.exposed_headers.join(","),
            );
        }
        if self.max_age > 0 {
            res.set_header("access-control-max-age", self.max_age.to_string());
        }
        if self.supports_credentials {
            res.set_header("access-control-allow-credentials", "true".to_string());
        }
    }
}

impl Middleware for CorsMiddleware {
    /// Never short-circuits: the downstream handler runs for every request,
    /// OPTIONS included. Preflight requests get no special treatment.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }

    /// Decorate the response after handler execution.
    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        self.apply(req.get_header("origin").unwrap_or(""), &req.method, res);
    }
}
