//! End-to-end request logging through the Axum router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use httplog::{HttpLogger, HttpServer, Options};

fn router(options: &Options) -> (Arc<HttpLogger>, Router) {
    let logger = Arc::new(HttpLogger::new(options.clone()));
    let router = HttpServer::build_router(logger.clone());
    (logger, router)
}

async fn get(router: &Router, uri: &str) -> StatusCode {
    let request = Request::builder()
        .uri(uri)
        .header("user-agent", "integration-test")
        .header("authorization", "Bearer token")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap().status()
}

fn json_options() -> Options {
    let mut options = Options {
        json: true,
        level_field_name: "severity".to_string(),
        skip_headers: vec!["X-API-Key".to_string()],
        ..Options::default()
    };
    options.tags.insert("env".to_string(), "test".to_string());
    options
}

#[tokio::test]
async fn test_json_event_per_request() {
    let options = json_options();
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    assert_eq!(get(&router, "/health").await, StatusCode::OK);

    let lines = logs.json_lines();
    assert_eq!(lines.len(), 1);
    let event = &lines[0];

    assert_eq!(event["severity"], "INFO");
    assert!(event.get("level").is_none());
    assert!(event["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(event["msg"], "GET /health => 200");
    assert_eq!(event["env"], "test");
    assert_eq!(event["method"], "GET");
    assert_eq!(event["path"], "/health");
    assert_eq!(event["status"], 200);
    assert_eq!(event["user_agent"], "integration-test");
    assert_ne!(event["request_id"], "unknown");

    let headers = event["request_headers"].as_str().unwrap();
    assert!(!headers.contains("secret"));
    assert!(!headers.contains("Bearer"));
    assert!(headers.contains("\"x-api-key\":\"***\""));
    assert!(headers.contains("\"authorization\":\"***\""));
}

#[tokio::test]
async fn test_quiet_down_route_logged_once() {
    let options = Options {
        json: true,
        quiet_down_routes: vec!["/health".to_string()],
        quiet_down_period: Duration::from_secs(3600),
        ..Options::default()
    };
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    for _ in 0..3 {
        assert_eq!(get(&router, "/health").await, StatusCode::OK);
    }
    get(&router, "/other").await;
    get(&router, "/other").await;

    let paths: Vec<String> = logs
        .json_lines()
        .iter()
        .map(|e| e["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(paths, vec!["/health", "/other", "/other"]);
}

#[tokio::test]
async fn test_concise_omits_details() {
    let options = Options {
        json: true,
        concise: true,
        ..Options::default()
    };
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    get(&router, "/health").await;

    let lines = logs.json_lines();
    assert_eq!(lines.len(), 1);
    let event = &lines[0];
    assert_eq!(event["status"], 200);
    assert!(event.get("elapsed_ms").is_some());
    assert!(event.get("user_agent").is_none());
    assert!(event.get("request_headers").is_none());
    assert!(event.get("proto").is_none());
}

#[tokio::test]
async fn test_level_follows_status() {
    let options = Options {
        json: true,
        ..Options::default()
    };
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    assert_eq!(get(&router, "/status/404").await, StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/status/503").await, StatusCode::SERVICE_UNAVAILABLE);

    let levels: Vec<String> = logs
        .json_lines()
        .iter()
        .map(|e| e["level"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(levels, vec!["WARN", "ERROR"]);
}

#[tokio::test]
async fn test_minimum_level_filters_events() {
    let options = Options {
        json: true,
        log_level: "error".to_string(),
        ..Options::default()
    };
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    get(&router, "/health").await;
    get(&router, "/status/404").await;
    get(&router, "/status/500").await;

    let lines = logs.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["status"], 500);
}

#[tokio::test]
async fn test_source_field() {
    let options = Options {
        json: true,
        source_field_name: "caller".to_string(),
        ..Options::default()
    };
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    get(&router, "/health").await;

    let lines = logs.json_lines();
    let caller = lines[0]["caller"].as_str().unwrap();
    assert!(caller.contains("middleware.rs:"));
    assert!(lines[0].get("source").is_none());
}

#[tokio::test]
async fn test_pretty_output() {
    let mut options = Options {
        time_field_format: "%H:%M:%S".to_string(),
        ..Options::default()
    };
    options.tags.insert("env".to_string(), "dev".to_string());
    let (logs, _guard) = common::capture(&options);
    let (_, router) = router(&options);

    get(&router, "/users/7").await;

    let lines = logs.lines();
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert!(line.contains(" INFO  GET /users/7 => 200 "));
    assert!(line.contains("env=dev"));
    assert!(line.contains("status=200"));
    assert!(!line.contains('\u{1b}'));
    // HH:MM:SS prefix
    assert_eq!(line.as_bytes()[2], b':');
    assert_eq!(line.as_bytes()[5], b':');
}

#[tokio::test]
async fn test_reconfigure_applies_to_next_request() {
    let options = Options {
        json: true,
        ..Options::default()
    };
    let (logs, _guard) = common::capture(&options);
    let (logger, router) = router(&options);

    get(&router, "/health").await;
    get(&router, "/health").await;

    logger.configure(Options {
        json: true,
        quiet_down_routes: vec!["/health".to_string()],
        ..Options::default()
    });

    get(&router, "/health").await;
    get(&router, "/health").await;

    // Two before reconfiguring, then only the first of the quieted route.
    assert_eq!(logs.json_lines().len(), 3);
}
