//! MediClean Core
//!
//! Core types shared across MediClean components.
//!
//! This crate provides:
//! - The error taxonomy every pipeline stage reports through
//! - The in-memory record table and its CSV representation
//! - The ingestion schema for medical-record uploads
//! - Artifact and metrics report types returned to callers

pub mod error;
pub mod schema;
pub mod table;
pub mod types;

pub use error::{Error, Result};
pub use schema::{FieldKind, FieldSpec, Schema};
pub use table::{Cell, RecordTable};
pub use types::{Artifact, ConfusionMatrix, MetricEntry, MetricsReport, PipelineResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::schema::Schema;
    pub use crate::table::RecordTable;
    pub use crate::types::{Artifact, ConfusionMatrix, MetricEntry, MetricsReport, PipelineResult};
}
