mod core;
mod cors;
mod tracing;

pub use self::tracing::TracingMiddleware;
pub use core::Middleware;
pub use cors::CorsMiddleware;
