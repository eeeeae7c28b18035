//! HTTP contract tests, driven through the router without a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use paral_compiler::Compiler;
use paral_core::wire::{
    CalculateResponse, ErrorResponse, ExpressionResponse, ExpressionsResponse, ResultResponse,
    TaskResponse,
};
use paral_core::{ExpressionStatus, OperationTimes, TaskReport, TaskStatus};
use paral_execution::LeasePolicy;
use paral_orchestrator::{build_router, Orchestrator};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let orchestrator = Orchestrator::in_memory(
        Compiler::new(OperationTimes::uniform(Duration::ZERO)),
        LeasePolicy::default(),
    );
    build_router(Arc::new(orchestrator))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

async fn submit(app: &Router, expression: &str) -> CalculateResponse {
    let (status, body) = send(app, post("/api/v1/calculate", json!({ "expression": expression }))).await;
    assert_eq!(status, StatusCode::CREATED);
    parse(&body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = parse(&body);
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn test_calculate_and_get() {
    let app = app();
    let created = submit(&app, "2+3*4").await;

    let (status, body) = send(&app, get(&format!("/api/v1/expressions/{}", created.id))).await;
    assert_eq!(status, StatusCode::OK);
    let response: ExpressionResponse = parse(&body);
    assert_eq!(response.expression.id, created.id);
    assert_eq!(response.expression.status, ExpressionStatus::Pending);
    assert_eq!(response.expression.tasks.len(), 2);

    let (status, body) = send(&app, get("/api/v1/expressions")).await;
    assert_eq!(status, StatusCode::OK);
    let list: ExpressionsResponse = parse(&body);
    assert_eq!(list.expressions.len(), 1);
}

#[tokio::test]
async fn test_invalid_expression_is_unprocessable() {
    let app = app();
    for text in ["2+(3", "2+a", "", "2+"] {
        let (status, body) = send(&app, post("/api/v1/calculate", json!({ "expression": text }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "input {:?}", text);
        let error: ErrorResponse = parse(&body);
        assert!(error.error.starts_with("expression is not valid"), "{}", error.error);
    }

    let (_, body) = send(&app, get("/api/v1/expressions")).await;
    let list: ExpressionsResponse = parse(&body);
    assert!(list.expressions.is_empty());
}

#[tokio::test]
async fn test_get_unknown_and_malformed_ids() {
    let app = app();
    let (status, _) = send(&app, get("/api/v1/expressions/01ARZ3NDEKTSV4RRFFQ69G5FAV")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/v1/expressions/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_worker_round_trip() {
    let app = app();
    let created = submit(&app, "(1+2)*4").await;

    let (status, _) = send(&app, get("/internal/task")).await;
    assert_eq!(status, StatusCode::OK);

    // 1+2 is leased; the product still waits on it
    let (status, body) = send(&app, get("/internal/task")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ErrorResponse = parse(&body);
    assert!(error.error.contains("no task"));

    let (_, body) = send(&app, get(&format!("/api/v1/expressions/{}", created.id))).await;
    let view: ExpressionResponse = parse(&body);
    let first = &view.expression.tasks[0];
    assert_eq!(first.status, TaskStatus::Dispatched);

    let report = TaskReport::completed(first.id, 3.0);
    let (status, body) = send(&app, post("/internal/task/result", serde_json::to_value(&report).unwrap())).await;
    assert_eq!(status, StatusCode::OK);
    let result: ResultResponse = parse(&body);
    assert_eq!(result.expression_status, ExpressionStatus::Pending);

    let (status, body) = send(&app, get("/internal/task")).await;
    assert_eq!(status, StatusCode::OK);
    let next: TaskResponse = parse(&body);
    assert_eq!((next.task.arg1, next.task.arg2), (3.0, 4.0));

    let report = TaskReport::completed(next.task.id, 12.0);
    let (_, body) = send(&app, post("/internal/task/result", serde_json::to_value(&report).unwrap())).await;
    let result: ResultResponse = parse(&body);
    assert_eq!(result.expression_status, ExpressionStatus::Completed);

    let (_, body) = send(&app, get(&format!("/api/v1/expressions/{}", created.id))).await;
    let view: ExpressionResponse = parse(&body);
    assert_eq!(view.expression.result, Some(12.0));

    // Reports on terminal tasks are rejected
    let (status, _) = send(&app, post("/internal/task/result", serde_json::to_value(&report).unwrap())).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_report_errors() {
    let app = app();
    submit(&app, "1+1").await;
    let (_, body) = send(&app, get("/internal/task")).await;
    let leased: TaskResponse = parse(&body);

    let unknown = TaskReport::completed(paral_core::TaskId::new(), 1.0);
    let (status, _) = send(&app, post("/internal/task/result", serde_json::to_value(&unknown).unwrap())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bad_status = json!({ "id": leased.task.id, "status": "finished", "result": 2.0 });
    let (status, _) = send(&app, post("/internal/task/result", bad_status)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // A completed report must carry its value; the task stays leased
    let no_result = json!({ "id": leased.task.id, "status": "completed" });
    let (status, body) = send(&app, post("/internal/task/result", no_result)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = parse(&body);
    assert!(error.error.contains("no result"), "{}", error.error);

    let failed = json!({ "id": leased.task.id, "status": "error", "error": "boom" });
    let (status, body) = send(&app, post("/internal/task/result", failed)).await;
    assert_eq!(status, StatusCode::OK);
    let result: ResultResponse = parse(&body);
    assert_eq!(result.expression_status, ExpressionStatus::Error);
}
