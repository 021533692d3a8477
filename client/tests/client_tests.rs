//! Exercises `BuildClient` against an in-process axum stand-in for the
//! build backend, checking request shapes and response handling end to end.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use metis_client::{BuildBackend, BuildClient, ClientError, HistoryQuery};
use metis_types::{BuildAction, BuildRequest, BuildState, VmAction, VmPowerState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    fn record(&self, route: &str, body: Value) {
        self.calls.lock().unwrap().push((route.to_string(), body));
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

async fn versions(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.record("get_versions", body.clone());
    match body["project_name"].as_str() {
        Some("waf") => Json(json!({"versions": ["3.2.0", "3.1.4"]})),
        _ => Json(json!({})),
    }
}

async fn esxi_state() -> Json<Value> {
    Json(json!({"data": [
        {"10.0.0.1": {
            "disk_total": 1000.0, "disk_usage": 250.0,
            "mem_total": 256.0, "mem_usage": 64.0,
            "cpu_total": 48.0, "cpu_usage": 12.0
        }}
    ]}))
}

async fn project_version(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.record("project_version", body);
    Json(json!({"data": {
        "waf-core@3.2": {"c9f1": "fix rule cache", "a001": "initial"},
        "waf-ui@1.0": {"77aa": "new dashboard"}
    }}))
}

async fn submit_build(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.record("submit_build", body);
    Json(json!({"info": "queued"}))
}

async fn build_action(
    State(rec): State<Recorder>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.record("build_action", body.clone());
    if body["deploy_id"] == "locked-build" {
        (
            StatusCode::CONFLICT,
            Json(json!({"info": "build is locked"})),
        )
    } else if body["deploy_id"] == "broken-build" {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!("boom")))
    } else {
        (StatusCode::OK, Json(json!({"info": "ok"})))
    }
}

async fn build_status(Path(deploy_id): Path<String>) -> impl IntoResponse {
    if deploy_id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"info": "no such build"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "deploy_id": deploy_id,
            "deploy_time": deploy_id,
            "step": "packaging",
            "state": "RUNNING",
            "task_id": "celery-42",
            "action": "build"
        })),
    )
}

async fn history(
    State(rec): State<Recorder>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.record("history", json!(params));
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    if page > 1 {
        return Json(json!({"history": []}));
    }
    Json(json!({"history": [
        {"id": 1, "iso_name": "waf-3.2.0-001", "is_lock": 1, "app_name": "waf", "app_version": "3.2.0",
         "start_build_time": "2024-05-01T09:00:00Z", "end_build_time": "2024-05-01T10:00:00Z",
         "ci_count": 3, "deploy_host": "10.0.0.1", "ip": "10.0.1.20", "state": "SUCCESS"},
        {"id": 2, "iso_name": "waf-3.2.0-002", "is_lock": 0, "app_name": "waf", "app_version": "3.2.0",
         "start_build_time": "2024-05-02T09:00:00Z", "end_build_time": null,
         "ci_count": 0, "deploy_host": "10.0.0.1", "ip": "", "state": "RUNNING"}
    ]}))
}

async fn vms() -> Json<Value> {
    Json(json!({"data": [
        {"id": 7, "vm_os": "centos7", "vm_ip": "10.0.1.20", "vm_name": "waf-test-7",
         "vm_host": "10.0.0.1", "vm_uuid": "4201-aa", "vm_state": "poweredOff"}
    ]}))
}

async fn vm_action(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.record("vm_action", body);
    Json(json!({"info": "ok"}))
}

async fn spawn_backend() -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/get_versions/", post(versions))
        .route("/esxi_state", get(esxi_state))
        .route("/project_version", post(project_version))
        .route("/build/", post(submit_build).put(build_action))
        .route("/build/:deploy_id", get(build_status))
        .route("/history", get(history))
        .route("/show_vms_state", get(vms))
        .route("/vm_action", post(vm_action))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), recorder)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetches_versions_for_project() {
    let (url, rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let versions = client.versions("waf").await.unwrap();
    assert_eq!(versions, ["3.2.0", "3.1.4"]);

    let none = client.versions("cosa").await.unwrap();
    assert!(none.is_empty());

    let calls = rec.calls();
    assert_eq!(calls[0], ("get_versions".to_string(), json!({"project_name": "waf"})));
}

#[tokio::test]
async fn fetches_host_resources() {
    let (url, _rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let hosts = client.host_resources().await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].ip, "10.0.0.1");
    assert_eq!(hosts[0].disk_fraction(), 0.25);
}

#[tokio::test]
async fn fetches_project_components_in_order() {
    let (url, rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let components = client.project_components("waf", "3.2.0").await.unwrap();
    let keys: Vec<_> = components.iter().map(|c| c.key.clone()).collect();
    assert_eq!(keys, ["waf-core@3.2", "waf-ui@1.0"]);
    assert_eq!(
        rec.calls()[0].1,
        json!({"app_name": "waf", "app_version": "3.2.0"})
    );
}

#[tokio::test]
async fn submits_build_request_body() {
    let (url, rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let mut request = BuildRequest::default();
    request.app_version = "3.2.0".into();
    request.projects.insert("waf-core@3.2".into(), "c9f1".into());
    client.submit_build(&request).await.unwrap();

    let (route, body) = &rec.calls()[0];
    assert_eq!(route, "submit_build");
    assert_eq!(body["app_version"], "3.2.0");
    assert_eq!(body["cpu"], "4");
    assert_eq!(body["projects"]["waf-core@3.2"], "c9f1");
    assert_eq!(body["is_new"], false);
}

#[tokio::test]
async fn history_sends_filters_as_query() {
    let (url, rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let rows = client
        .history(&HistoryQuery::first_page("waf", "3.2.0"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_locked());
    assert_eq!(rows[1].state, BuildState::Running);
    assert_eq!(rows[1].end_build_time, None);

    let next = client
        .history(&HistoryQuery {
            page: 2,
            project: "waf".into(),
            version: "3.2.0".into(),
        })
        .await
        .unwrap();
    assert!(next.is_empty());

    assert_eq!(
        rec.calls()[0].1,
        json!({"page": "1", "project": "waf", "version": "3.2.0"})
    );
}

#[tokio::test]
async fn reads_build_details_and_task_state() {
    let (url, _rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let details = client.build_details("waf-3.2.0-002").await.unwrap();
    assert_eq!(details.deploy_id, "waf-3.2.0-002");
    assert_eq!(details.task_id, "celery-42");
    assert_eq!(details.state, BuildState::Running);

    let task = client.task_state("waf-3.2.0-002").await.unwrap();
    assert_eq!(task.deploy_time, "waf-3.2.0-002");
    assert_eq!(task.step, "packaging");
}

#[tokio::test]
async fn deploy_id_with_reserved_characters_stays_one_segment() {
    let (url, _rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let details = client.build_details("waf/3.2?x").await.unwrap();
    assert_eq!(details.deploy_id, "waf/3.2?x");
}

#[tokio::test]
async fn missing_build_is_rejected_with_info() {
    let (url, _rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    match client.build_details("missing").await {
        Err(ClientError::Rejected { status, info }) => {
            assert_eq!(status, 404);
            assert_eq!(info.as_deref(), Some("no such build"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn build_actions_report_backend_info() {
    let (url, rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    client
        .build_action(BuildAction::Revoke, "waf-3.2.0-002")
        .await
        .unwrap();
    assert_eq!(
        rec.calls()[0].1,
        json!({"action": "revoke", "deploy_id": "waf-3.2.0-002"})
    );

    let err = client
        .build_action(BuildAction::Delete, "locked-build")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "build is locked");

    let err = client
        .build_action(BuildAction::Delete, "broken-build")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Rejected {
            status: 500,
            info: None
        }
    ));
}

#[tokio::test]
async fn lists_vms_and_sends_power_actions() {
    let (url, rec) = spawn_backend().await;
    let client = BuildClient::new(&url);

    let vms = client.vms().await.unwrap();
    assert_eq!(vms.len(), 1);
    assert_eq!(vms[0].vm_state, VmPowerState::PoweredOff);

    client.vm_action(VmAction::PowerOn, "4201-aa").await.unwrap();
    assert_eq!(
        rec.calls()[0],
        (
            "vm_action".to_string(),
            json!({"action": "poweron", "vm_uuid": "4201-aa"})
        )
    );
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BuildClient::new(&format!("http://{addr}"));
    let err = client.vms().await.unwrap_err();
    assert!(matches!(err, ClientError::Unreachable(_)), "got {err:?}");
}
