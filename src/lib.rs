//! # corsgate
//!
//! **corsgate** is a CORS (Cross-Origin Resource Sharing) response-decoration
//! middleware for synchronous HTTP request pipelines.
//!
//! ## Overview
//!
//! The crate is built around a single decision: after a downstream handler has
//! produced a response, compare the request's `Origin` header against a fixed
//! allow-list and, if it passes, decorate the response with the CORS header
//! set. The policy is configured once at startup and treated as immutable
//! while requests are being served.
//!
//! The library is organized into a handful of modules:
//!
//! - **[`middleware`]** - the [`Middleware`] trait plus the built-in
//!   [`CorsMiddleware`] and [`TracingMiddleware`]
//! - **[`pipeline`]** - request/response types and the [`Pipeline`] that runs
//!   an ordered middleware chain around a handler function
//! - **[`config`]** - YAML and environment based policy configuration
//! - **[`ids`]** - ULID-backed request identifiers for log correlation
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use corsgate::{CorsMiddleware, HandlerRequest, HandlerResponse, HeaderVec, Pipeline};
//! use http::Method;
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.add_middleware(Arc::new(
//!     CorsMiddleware::new()
//!         .allowed_origins(vec!["https://app.example".into()])
//!         .allowed_methods(vec!["GET".into(), "POST".into()]),
//! ));
//!
//! let mut headers = HeaderVec::new();
//! headers.push((Arc::from("origin"), "https://app.example".to_string()));
//! let req = HandlerRequest::new(Method::GET, "/pets", headers, None);
//!
//! let res: anyhow::Result<HandlerResponse> = pipeline.handle(&req, |_req| {
//!     Ok(HandlerResponse::json(200, serde_json::json!({ "ok": true })))
//! });
//! assert_eq!(
//!     res.unwrap().get_header("access-control-allow-origin"),
//!     Some("https://app.example"),
//! );
//! ```
//!
//! ## Runtime Considerations
//!
//! The pipeline is synchronous: `handle` runs middleware hooks and the handler
//! on the calling thread with no suspension points. A shared `Pipeline` (and
//! the middleware inside it) is safe to use from many threads concurrently as
//! long as configuration happened before serving started - the intended
//! lifecycle is configure, freeze, serve.
//!
//! The CORS decision itself never logs and never short-circuits the handler;
//! per-request logging lives in the pipeline and in [`TracingMiddleware`].

pub mod config;
pub mod ids;
pub mod middleware;
pub mod pipeline;

pub use config::CorsConfig;
pub use middleware::{CorsMiddleware, Middleware, TracingMiddleware};
pub use pipeline::{HandlerRequest, HandlerResponse, HeaderVec, Pipeline};
