use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use corsgate::{
    middleware::Middleware,
    pipeline::{HandlerRequest, HandlerResponse, HeaderVec, Pipeline},
    CorsMiddleware, TracingMiddleware,
};
use http::Method;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn request_with_origin(method: Method, path: &str, origin: &str) -> HandlerRequest {
    let mut headers = HeaderVec::new();
    headers.push((Arc::from("origin"), origin.to_string()));
    HandlerRequest::new(method, path, headers, None)
}

/// Middleware that answers every request itself, like an auth layer
/// rejecting a request before it reaches the handler.
struct ShortCircuitMiddleware {
    status: u16,
}

impl Middleware for ShortCircuitMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        Some(HandlerResponse::error(self.status, "Unauthorized"))
    }
}

/// Middleware that records which hooks fired.
#[derive(Default)]
struct RecordingMiddleware {
    before_calls: AtomicUsize,
    after_called: AtomicBool,
}

impl Middleware for RecordingMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.before_calls.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {
        self.after_called.store(true, Ordering::Relaxed);
    }
}

#[test]
fn test_end_to_end_wildcard_policy() {
    init_tracing();
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(Arc::new(
        CorsMiddleware::new().allowed_methods(vec!["GET".into(), "POST".into()]),
    ));

    let req = request_with_origin(Method::GET, "/pets", "https://x.test");
    let resp: anyhow::Result<HandlerResponse> = pipeline.handle(&req, |_req| {
        Ok(HandlerResponse::new(
            200,
            HeaderVec::new(),
            serde_json::json!("ok"),
        ))
    });
    let resp = resp.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, serde_json::json!("ok"));
    assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
    assert_eq!(
        resp.get_header("access-control-allow-methods"),
        Some("GET,POST")
    );
    assert_eq!(resp.get_header("access-control-allow-headers"), Some("*"));
    assert_eq!(resp.get_header("access-control-expose-headers"), None);
    assert_eq!(resp.get_header("access-control-max-age"), None);
    assert_eq!(resp.get_header("access-control-allow-credentials"), None);
}

#[test]
fn test_end_to_end_rejected_origin_returns_raw_response() {
    init_tracing();
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(Arc::new(
        CorsMiddleware::new().allowed_origins(vec!["https://trusted.test".into()]),
    ));

    let req = request_with_origin(Method::GET, "/pets", "https://evil.test");
    let resp: anyhow::Result<HandlerResponse> = pipeline.handle(&req, |_req| {
        Ok(HandlerResponse::json(200, serde_json::json!({ "id": 1 })))
    });
    let resp = resp.unwrap();

    // Exactly the handler's response: its one content-type header and
    // nothing else.
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, serde_json::json!({ "id": 1 }));
    assert_eq!(resp.headers.len(), 1);
    assert_eq!(resp.get_header("content-type"), Some("application/json"));
}

#[test]
fn test_early_response_still_gets_cors_headers() {
    init_tracing();
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(Arc::new(ShortCircuitMiddleware { status: 401 }));
    pipeline.add_middleware(Arc::new(CorsMiddleware::new()));

    let handler_calls = AtomicUsize::new(0);
    let req = request_with_origin(Method::GET, "/protected", "https://x.test");
    let resp: anyhow::Result<HandlerResponse> = pipeline.handle(&req, |_req| {
        handler_calls.fetch_add(1, Ordering::Relaxed);
        Ok(HandlerResponse::json(200, serde_json::Value::Null))
    });
    let resp = resp.unwrap();

    assert_eq!(handler_calls.load(Ordering::Relaxed), 0);
    assert_eq!(resp.status, 401);
    assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
}

#[test]
fn test_remaining_before_hooks_observe_short_circuited_request() {
    init_tracing();
    let recorder = Arc::new(RecordingMiddleware::default());
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(Arc::new(ShortCircuitMiddleware { status: 403 }));
    pipeline.add_middleware(recorder.clone());

    let req = request_with_origin(Method::GET, "/", "https://x.test");
    let resp: anyhow::Result<HandlerResponse> = pipeline
        .handle(&req, |_req| Ok(HandlerResponse::json(200, serde_json::Value::Null)));

    assert_eq!(resp.unwrap().status, 403);
    assert_eq!(recorder.before_calls.load(Ordering::Relaxed), 1);
    assert!(recorder.after_called.load(Ordering::Relaxed));
}

#[test]
fn test_handler_error_propagates_and_skips_after_hooks() {
    init_tracing();
    let recorder = Arc::new(RecordingMiddleware::default());
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(recorder.clone());
    pipeline.add_middleware(Arc::new(CorsMiddleware::new()));

    let req = request_with_origin(Method::GET, "/", "https://x.test");
    let resp: Result<HandlerResponse, String> =
        pipeline.handle(&req, |_req| Err("upstream timeout".to_string()));

    assert_eq!(resp.unwrap_err(), "upstream timeout");
    assert!(!recorder.after_called.load(Ordering::Relaxed));
}

#[test]
fn test_tracing_middleware_leaves_response_untouched() {
    init_tracing();
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(Arc::new(TracingMiddleware));
    pipeline.add_middleware(Arc::new(CorsMiddleware::new()));

    let req = request_with_origin(Method::POST, "/pets", "https://x.test");
    let resp: anyhow::Result<HandlerResponse> = pipeline.handle(&req, |_req| {
        Ok(HandlerResponse::json(201, serde_json::json!({ "id": 7 })))
    });
    let resp = resp.unwrap();

    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, serde_json::json!({ "id": 7 }));
    assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
}

#[test]
fn test_shared_pipeline_across_threads() {
    init_tracing();
    let mut pipeline = Pipeline::new();
    pipeline.add_middleware(Arc::new(
        CorsMiddleware::new().allowed_origins(vec!["https://a.test".into()]),
    ));
    let pipeline = Arc::new(pipeline);
    let handled = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for _ in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        let handled = Arc::clone(&handled);
        handles.push(std::thread::spawn(move || {
            let req = request_with_origin(Method::GET, "/pets", "https://a.test");
            let resp: anyhow::Result<HandlerResponse> = pipeline.handle(&req, |_req| {
                handled.fetch_add(1, Ordering::Relaxed);
                Ok(HandlerResponse::json(200, serde_json::Value::Null))
            });
            assert_eq!(
                resp.unwrap().get_header("access-control-allow-origin"),
                Some("https://a.test")
            );
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(handled.load(Ordering::Relaxed), 8);
}

#[test]
fn test_request_id_taken_from_header_when_valid() {
    let mut headers = HeaderVec::new();
    headers.push((
        Arc::from("x-request-id"),
        "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
    ));
    let req = HandlerRequest::new(Method::GET, "/", headers, None);
    assert_eq!(req.request_id.to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");

    let mut headers = HeaderVec::new();
    headers.push((Arc::from("x-request-id"), "not-a-ulid".to_string()));
    let req = HandlerRequest::new(Method::GET, "/", headers, None);
    // Invalid ids are replaced with a freshly generated ULID.
    assert_eq!(req.request_id.to_string().len(), 26);
    assert_ne!(req.request_id.to_string(), "not-a-ulid");
}
