//! Ingestion schema
//!
//! Required fields are checked once, right after the header row is trimmed,
//! so a malformed upload fails before any stage runs.

use crate::error::{Error, Result};
use crate::table::RecordTable;

/// Free-text clinical notes column
pub const NOTES: &str = "Notes";

/// Free-text risk column the label is derived from
pub const LIFE_THREATS: &str = "Life Threats";

/// Expected value kind of a required field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any string; missing values allowed
    Text,
}

/// A field the pipeline reads directly
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Set of required fields
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields touched by the medical-records pipeline
    pub fn medical_records() -> Self {
        Self::new(vec![
            FieldSpec {
                name: NOTES,
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: LIFE_THREATS,
                kind: FieldKind::Text,
            },
        ])
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check that every required field is present and the table has rows
    pub fn validate(&self, table: &RecordTable) -> Result<()> {
        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| !table.has_column(f.name))
            .map(|f| f.name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::data(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        // Every cell is already a string or missing, which is all `Text` needs.
        if table.is_empty() {
            return Err(Error::data("table contains no records"));
        }

        Ok(())
    }
}
