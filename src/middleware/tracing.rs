use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::pipeline::{HandlerRequest, HandlerResponse};

/// Structured per-request logging.
///
/// Emits a debug event when a request enters the chain and an info event with
/// status and latency when the response leaves it. Keyed on the request ID so
/// the two ends correlate.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "request received"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        info!(
            request_id = %req.request_id,
            status = res.status,
            latency_ms = latency.as_millis() as u64,
            "request complete"
        );
    }
}
