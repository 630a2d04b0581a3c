
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use runnerd::allowlist::Allowlist;
use runnerd::scheduler::{JobStatus, Scheduler};
use runnerd::server::{router, AppState};
use test_harness::{spec, wait_for_started, wait_for_status, FakeExecutor};

fn test_app(limit: usize, executor: Arc<FakeExecutor>) -> (Router, Scheduler) {
    let scheduler = Scheduler::new(limit, executor);
    let state = AppState {
        scheduler: scheduler.clone(),
        allowlist: Arc::new(Allowlist::new(["echo", "sleep"])),
    };
    (router(state), scheduler)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn submit_returns_a_job_id() {
    let executor = Arc::new(FakeExecutor::new());
    let (app, scheduler) = test_app(1, executor);

    let response = app
        .oneshot(post_json(
            "/api/jobs",
            json!({"Command": "echo", "Arguments": ["hi"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let id: Uuid = body["jobId"].as_str().unwrap().parse().unwrap();

    let job = scheduler.get(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.command.arguments, vec!["hi"]);
}

#[tokio::test]
async fn submit_rejects_commands_not_on_the_allowlist() {
    let executor = Arc::new(FakeExecutor::new());
    let (app, scheduler) = test_app(1, executor);

    let response = app
        .oneshot(post_json("/api/jobs", json!({"Command": "rm"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not allowed"));

    // rejected before a job was ever created
    let snapshot = scheduler.status().await;
    assert!(snapshot.queued.is_empty());
    assert!(snapshot.running.is_empty());
    assert!(snapshot.completed.is_empty());
}

#[tokio::test]
async fn status_partitions_jobs_and_keeps_the_wire_shape() {
    let executor = Arc::new(FakeExecutor::new());
    let (app, scheduler) = test_app(1, executor);

    let running = scheduler.submit(spec("echo", &["a"])).await;
    let queued = scheduler.submit(spec("sleep", &["10"])).await;

    let response = app.oneshot(get("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let running_entry = &body["running"][running.to_string().as_str()];
    assert_eq!(running_entry["Status"], "Running");
    assert_eq!(running_entry["Command"]["Command"], "echo");
    assert_eq!(running_entry["Command"]["Arguments"][0], "a");
    assert!(!running_entry["StartTime"].is_null());
    assert!(running_entry["EndTime"].is_null());

    let queued_entry = &body["queued"][0];
    assert_eq!(queued_entry["JobId"], queued.to_string());
    assert_eq!(queued_entry["Status"], "Queued");
    assert!(queued_entry["StartTime"].is_null());

    assert_eq!(body["completed"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn get_job_returns_snapshot_or_404() {
    let executor = Arc::new(FakeExecutor::new());
    let (app, scheduler) = test_app(1, executor);

    let id = scheduler.submit(spec("echo", &[])).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/jobs/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["JobId"], id.to_string());
    assert_eq!(body["Status"], "Running");

    let response = app
        .oneshot(get(&format!("/api/jobs/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn cancel_of_unknown_job_still_reports_ok() {
    let executor = Arc::new(FakeExecutor::new());
    let (app, _scheduler) = test_app(1, executor);

    let id = Uuid::new_v4();
    let response = app
        .oneshot(post_json(&format!("/api/jobs/{id}/cancel"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["outcome"], "noop");
    assert_eq!(body["jobId"], id.to_string());
}

#[tokio::test]
async fn cancel_of_running_job_goes_through() {
    let executor = Arc::new(FakeExecutor::new());
    let (app, scheduler) = test_app(1, executor.clone());

    let id = scheduler.submit(spec("sleep", &["30"])).await;
    wait_for_started(&executor, 1).await;

    let response = app
        .oneshot(post_json(&format!("/api/jobs/{id}/cancel"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "signalled");

    wait_for_status(&scheduler, id, JobStatus::Cancelled).await;
}
