//! Shared application state

use crate::config::ServerConfig;
use mediclean_core::Artifact;
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Held for the duration of a pipeline run; runs never overlap.
    /// Holds the id of the latest run, whose directories are still on disk.
    pub run_lock: Arc<Mutex<Option<Uuid>>>,

    /// Artifacts of the latest run, served by the download routes.
    /// Empty while a run is in progress or after a failed run.
    pub latest_artifacts: Arc<RwLock<Vec<Artifact>>>,

    /// Prometheus handle for rendering `/metrics`
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            run_lock: Arc::new(Mutex::new(None)),
            latest_artifacts: Arc::new(RwLock::new(Vec::new())),
            metrics,
        }
    }

    /// Look up an artifact of the latest run by name
    pub fn find_artifact(&self, name: &str) -> Option<Artifact> {
        self.latest_artifacts
            .read()
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }

    /// Snapshot of the latest run's artifacts
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.latest_artifacts.read().clone()
    }

    /// Replace the artifact list
    pub fn set_artifacts(&self, artifacts: Vec<Artifact>) {
        *self.latest_artifacts.write() = artifacts;
    }
}
