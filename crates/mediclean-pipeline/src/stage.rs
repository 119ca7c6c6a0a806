//! Table stage trait and common types

use mediclean_core::{RecordTable, Result};

/// A step that rewrites the record table in place
///
/// Stages may add or overwrite columns but never add or drop rows. Each one
/// is followed by an artifact snapshot named [`TableStage::artifact_name`].
pub trait TableStage: Send + Sync {
    /// Apply the stage to the table
    fn apply(&self, table: &mut RecordTable) -> Result<()>;

    /// Get the stage name
    fn name(&self) -> &str;

    /// File name of the snapshot recorded after this stage
    fn artifact_name(&self) -> &str;
}

/// Outcome of one stage
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Stage name
    pub stage: String,

    /// Rows in the table after the stage
    pub rows: usize,

    /// Latency in microseconds
    pub latency_us: u64,
}
