//! Pipeline core module - request/response types and the middleware chain
//! runner. This is the per-request hot path; it performs no I/O of its own
//! and allocates only for header values.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::ids::RequestId;
use crate::middleware::Middleware;

/// Maximum inline headers before heap allocation. Most requests carry well
/// under 16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because they repeat across requests
/// (`content-type`, `origin`, ...) and clone in O(1); values are per-request
/// data and stay `String`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// An incoming HTTP request as seen by the middleware chain.
///
/// The pipeline does not parse HTTP itself; the embedding server constructs
/// one of these from whatever transport it uses and hands it to
/// [`Pipeline::handle`].
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for log correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, ...)
    pub method: Method,
    /// Request path
    pub path: String,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl HandlerRequest {
    /// Build a request from its parts.
    ///
    /// The request ID is taken from an `X-Request-Id` header when one is
    /// present and parses as a ULID; otherwise a fresh one is generated.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderVec, body: Option<Value>) -> Self {
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
                .map(|(_, v)| v.as_str()),
        );
        Self {
            request_id,
            method,
            path: path.into(),
            headers,
            body,
        }
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response flowing back through the middleware chain.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, ...)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a `content-type` header set
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create an error response with a JSON `{ "error": message }` body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header, replacing any existing value case-insensitively
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Ordered middleware chain wrapped around a handler function.
///
/// Middleware runs in registration order: every `before` hook fires on the
/// way in, the handler runs unless a hook produced an early response, and
/// every `after` hook fires on the way out. A shared `Pipeline` is immutable
/// during request processing; build it fully before serving.
#[derive(Default)]
pub struct Pipeline {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    /// Create an empty pipeline
    #[must_use]
    pub fn new() -> Self {
        Pipeline {
            middlewares: Vec::new(),
        }
    }

    /// Append middleware to the chain.
    ///
    /// Execution order is registration order, for both `before` and `after`
    /// hooks.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Run a request through the chain and the given handler.
    ///
    /// The first `before` hook returning a response wins, but the remaining
    /// hooks still observe the request. A handler error propagates unmodified
    /// via `?` - no `after` hook runs in that case and no response is
    /// produced.
    pub fn handle<F, E>(&self, req: &HandlerRequest, handler: F) -> Result<HandlerResponse, E>
    where
        F: FnOnce(&HandlerRequest) -> Result<HandlerResponse, E>,
    {
        debug!(
            request_id = %req.request_id,
            middleware_count = self.middlewares.len(),
            "middleware before pass"
        );

        let mut early_resp: Option<HandlerResponse> = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            if early_resp.is_none() {
                early_resp = mw.before(req);
                if early_resp.is_some() {
                    debug!(
                        request_id = %req.request_id,
                        middleware_idx = idx,
                        "middleware returned early response"
                    );
                }
            } else {
                mw.before(req);
            }
        }

        let (mut resp, latency) = match early_resp {
            Some(r) => (r, Duration::from_millis(0)),
            None => {
                info!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    "request dispatched to handler"
                );
                let start = Instant::now();
                let r = handler(req)?;
                let latency = start.elapsed();
                info!(
                    request_id = %req.request_id,
                    status = r.status,
                    latency_ms = latency.as_millis() as u64,
                    "handler response received"
                );
                (r, latency)
            }
        };

        debug!(
            request_id = %req.request_id,
            response_status = resp.status,
            "middleware after pass"
        );
        for mw in &self.middlewares {
            mw.after(req, &mut resp, latency);
        }

        Ok(resp)
    }
}
