//! Server configuration

use mediclean_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where uploaded files are saved
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Parent of the per-run artifact directories
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size for uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Preparation and training settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    /// Load configuration from file, or use defaults when it does not exist
    pub fn load(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        config.pipeline.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides
    pub fn with_overrides(mut self, listen: Option<String>, port: Option<u16>) -> Self {
        if let Some(listen) = listen {
            self.listen = listen;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            upload_dir: default_upload_dir(),
            processed_dir: default_processed_dir(),
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
            pipeline: PipelineConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("processed")
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}
