//! Label deriver
//!
//! Turns the free-text `Life Threats` field into the binary `is_incorrect`
//! label by substring search.

use crate::stage::TableStage;
use aho_corasick::AhoCorasick;
use mediclean_core::schema::LIFE_THREATS;
use mediclean_core::{Error, RecordTable, Result};
use tracing::debug;

/// Column holding the derived 0/1 label
pub const LABEL: &str = "is_incorrect";

/// String form of a missing value before matching
const MISSING: &str = "nan";

/// Marks a row positive when `Life Threats` mentions "yes" anywhere
pub struct LabelDeriver {
    markers: AhoCorasick,
}

impl LabelDeriver {
    /// Create a deriver matching "yes", ASCII case-insensitively
    pub fn new() -> Result<Self> {
        let markers = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(["yes"])
            .map_err(|e| Error::data(format!("Failed to build label matcher: {}", e)))?;

        Ok(Self { markers })
    }

    /// Label for one cell
    pub fn label(&self, cell: Option<&str>) -> u8 {
        u8::from(self.markers.is_match(cell.unwrap_or(MISSING)))
    }

    /// Parse the label column written by this stage
    pub fn labels(table: &RecordTable) -> Result<Vec<u8>> {
        table
            .cells(LABEL)?
            .enumerate()
            .map(|(row, cell)| match cell {
                Some("0") => Ok(0),
                Some("1") => Ok(1),
                other => Err(Error::data(format!(
                    "row {} has invalid label {:?}",
                    row, other
                ))),
            })
            .collect()
    }
}

impl TableStage for LabelDeriver {
    fn apply(&self, table: &mut RecordTable) -> Result<()> {
        let mut positives = 0usize;
        table.map_column(LIFE_THREATS, LABEL, |cell| {
            let label = self.label(cell);
            positives += usize::from(label);
            Some(label.to_string())
        })?;
        debug!(positives, rows = table.len(), "Derived labels");
        Ok(())
    }

    fn name(&self) -> &str {
        "label"
    }

    fn artifact_name(&self) -> &str {
        "Error_Correction.csv"
    }
}
