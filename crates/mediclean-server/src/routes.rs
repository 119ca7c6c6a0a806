//! HTTP routes and handlers

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mediclean_core::{Error, PipelineResult};
use mediclean_pipeline::run_pipeline;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::archive::{build_archive, ArchiveError, ARCHIVE_NAME};
use crate::config::ServerConfig;
use crate::state::AppState;

/// Multipart field carrying the uploaded table
const FILE_FIELD: &str = "file";

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Save the uploaded CSV, run the pipeline on it, and return the report
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PipelineResult>, AppError> {
    metrics::counter!("mediclean_uploads_total").increment(1);

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(|name| std::path::Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("No selected file".to_string()))?;

        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?;

        upload = Some((file_name, content));
        break;
    }

    let (file_name, content) =
        upload.ok_or_else(|| AppError::BadRequest("No file part".to_string()))?;

    let result = execute_run(&state, &file_name, &content).await?;
    Ok(Json(result))
}

/// Stage the upload and run the pipeline into fresh run directories, one run at a time
///
/// The previous run's artifacts stop being served and its directories are
/// removed before the new run starts, whether or not the new run succeeds.
async fn execute_run(
    state: &AppState,
    file_name: &str,
    content: &[u8],
) -> Result<PipelineResult, AppError> {
    let mut latest_run = state.run_lock.lock().await;

    state.set_artifacts(Vec::new());
    if let Some(previous) = latest_run.take() {
        remove_run(&state.config, previous).await;
    }

    let run_id = Uuid::new_v4();
    *latest_run = Some(run_id);

    let upload_dir = state.config.upload_dir.join(run_id.to_string());
    tokio::fs::create_dir_all(&upload_dir).await?;
    let file_path = upload_dir.join(file_name);
    tokio::fs::write(&file_path, content).await?;
    info!(%run_id, file = %file_name, bytes = content.len(), "Saved upload");

    let output_dir = state.config.processed_dir.join(run_id.to_string());
    let pipeline_config = state.config.pipeline.clone();
    info!(%run_id, "Starting run");

    let result = tokio::task::spawn_blocking(move || {
        run_pipeline(&file_path, &pipeline_config, &output_dir)
    })
    .await
    .map_err(|e| AppError::Internal(format!("pipeline task failed: {}", e)))??;

    state.set_artifacts(result.generated_files.clone());
    info!(%run_id, artifacts = result.generated_files.len(), "Run finished");
    Ok(result)
}

/// Delete the upload and artifact directories of a finished run
async fn remove_run(config: &ServerConfig, run_id: Uuid) {
    let dirs: [PathBuf; 2] = [
        config.upload_dir.join(run_id.to_string()),
        config.processed_dir.join(run_id.to_string()),
    ];
    for dir in dirs {
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(%run_id, dir = %dir.display(), "Removed previous run directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(%run_id, dir = %dir.display(), error = %e, "Failed to remove run directory")
            }
        }
    }
}

/// Serve one artifact of the latest run as an attachment
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let artifact = state
        .find_artifact(&filename)
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let content = tokio::fs::read(&artifact.path).await.map_err(|e| {
        warn!(file = %artifact.name, error = %e, "Recorded artifact is unreadable");
        AppError::NotFound("File not found".to_string())
    })?;

    Ok(attachment(&artifact.name, "text/csv", content))
}

/// Serve every artifact of the latest run as one zip
pub async fn download_all(State(state): State<AppState>) -> Result<Response, AppError> {
    let artifacts = state.artifacts();
    let bytes = tokio::task::spawn_blocking(move || build_archive(&artifacts))
        .await
        .map_err(|e| AppError::Internal(format!("archive task failed: {}", e)))??;

    Ok(attachment(ARCHIVE_NAME, "application/zip", bytes))
}

fn attachment(name: &str, content_type: &'static str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        body,
    )
        .into_response()
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    Pipeline(Error),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Pipeline(Error::Io(err))
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Empty => AppError::BadRequest(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Pipeline(err) => {
                let status = match &err {
                    Error::Data(_) => StatusCode::BAD_REQUEST,
                    Error::Imbalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, json!({ "error": err.to_string(), "kind": err.kind() }))
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}
