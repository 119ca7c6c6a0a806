//! HTTP route tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mediclean_server::{build_app, AppState, ServerConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "mediclean-test-boundary";

const SIX_ROWS: &str = "\
Patient ID,Notes,Life Threats
1,Dr. John reports chest pains after running,Yes
2,,No
3,Patient was walking to the hospital with Mary,no threats reported
4,Mild headaches and coughing,Patient said yes to risk
5,Called phone line about medications,none
6,Follow-up visits scheduled weekly,No
";

fn test_app(dir: &TempDir) -> Router {
    let mut config = ServerConfig {
        upload_dir: dir.path().join("uploads"),
        processed_dir: dir.path().join("processed"),
        ..Default::default()
    };
    config.pipeline.forest.n_trees = 20;

    let handle = PrometheusBuilder::new().build_recorder().handle();
    build_app(AppState::new(config, handle))
}

fn multipart_request(field: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        concat!(
            "--{b}\r\n",
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n",
            "Content-Type: text/csv\r\n\r\n",
            "{content}\r\n",
            "--{b}--\r\n",
        ),
        b = BOUNDARY,
        field = field,
        filename = filename,
        content = content,
    );

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn dir_entries(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let response = test_app(&dir).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_archive_without_artifacts_is_client_error() {
    let dir = TempDir::new().unwrap();
    let response = test_app(&dir).oneshot(get("/download/all")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No files to zip");
}

#[tokio::test]
async fn test_unknown_download_is_not_found() {
    let dir = TempDir::new().unwrap();
    let response = test_app(&dir)
        .oneshot(get("/download/secrets.csv"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "File not found");
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let dir = TempDir::new().unwrap();
    let response = test_app(&dir)
        .oneshot(multipart_request("document", "records.csv", SIX_ROWS))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file part");
}

#[tokio::test]
async fn test_upload_with_empty_filename() {
    let dir = TempDir::new().unwrap();
    let response = test_app(&dir)
        .oneshot(multipart_request("file", "", SIX_ROWS))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No selected file");
}

#[tokio::test]
async fn test_upload_missing_columns_is_data_error() {
    let dir = TempDir::new().unwrap();
    let response = test_app(&dir)
        .oneshot(multipart_request("file", "records.csv", "Patient ID,Notes\n1,pain\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "data_error");
}

#[tokio::test]
async fn test_upload_single_class_is_unprocessable() {
    let dir = TempDir::new().unwrap();
    let csv = "Notes,Life Threats\nchest pain,No\nmild cough,No\nback ache,none\n";
    let response = test_app(&dir)
        .oneshot(multipart_request("file", "records.csv", csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["kind"], "imbalance_error");
}

#[tokio::test]
async fn test_upload_then_download() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .clone()
        .oneshot(multipart_request("file", "records.csv", SIX_ROWS))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Files processed.");
    assert_eq!(body["generated_files"].as_array().unwrap().len(), 6);
    assert_eq!(body["randomForestData"].as_array().unwrap().len(), 7);
    assert_eq!(body["svmData"][6]["name"], "Accuracy");

    let matrix = &body["confusionMatrixData"];
    let total: u64 = ["tn", "fp", "fn", "tp"]
        .iter()
        .map(|k| matrix[k].as_u64().unwrap())
        .sum();
    assert_eq!(total, 2);

    let run_uploads = dir_entries(&dir.path().join("uploads"));
    assert_eq!(run_uploads.len(), 1);
    assert!(run_uploads[0].join("records.csv").exists());

    let response = app
        .clone()
        .oneshot(get("/download/Filled_missing.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Filled_missing.csv\""
    );
    let csv = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&csv).contains("No medical history available"));

    let response = app.clone().oneshot(get("/download/all")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    let zip = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(zip.starts_with(b"PK"));
}

#[tokio::test]
async fn test_failed_run_clears_previous_artifacts() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .clone()
        .oneshot(multipart_request("file", "records.csv", SIX_ROWS))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let single_class = "Notes,Life Threats\nchest pain,No\nmild cough,No\n";
    let response = app
        .clone()
        .oneshot(multipart_request("file", "other.csv", single_class))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.clone().oneshot(get("/download/all")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No files to zip");

    let response = app
        .clone()
        .oneshot(get("/download/Filled_missing.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_run_removes_previous_run_directories() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(multipart_request("file", "records.csv", SIX_ROWS))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let processed = dir_entries(&dir.path().join("processed"));
    assert_eq!(processed.len(), 1);

    let uploads = dir_entries(&dir.path().join("uploads"));
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].join("records.csv").exists());

    // Each run stages its upload under its own id, next to its artifacts
    assert_eq!(uploads[0].file_name(), processed[0].file_name());

    let response = app
        .clone()
        .oneshot(get("/download/Anonymization.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
