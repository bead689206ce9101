use std::time::Duration;

use crate::pipeline::{HandlerRequest, HandlerResponse};

/// A hook pair wrapped around handler execution by a
/// [`Pipeline`](crate::pipeline::Pipeline).
///
/// `before` may short-circuit the handler by returning a response; `after`
/// sees every response (handler-produced or early) and may modify it in
/// place.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
