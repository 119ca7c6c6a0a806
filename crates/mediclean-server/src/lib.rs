//! MediClean Server
//!
//! HTTP surface for the MediClean pipeline: upload a medical-record CSV, get
//! back classifier metrics, and download the intermediate tables of the
//! latest run individually or as one zip.

pub mod app;
pub mod archive;
pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use app::{build_app, run_server};
pub use config::ServerConfig;
pub use state::AppState;
