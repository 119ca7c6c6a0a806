//! Text normalizer stages
//!
//! Three stages run in order against the `Notes` column:
//! 1. [`FillMissingNotes`] replaces absent notes with a sentinel string
//! 2. [`CleanNotes`] lowercases and strips punctuation into `Cleaned_Notes`
//! 3. [`LemmatizeNotes`] rewrites `Cleaned_Notes` token by token

use crate::lemmatizer::{Lemmatizer, RuleLemmatizer};
use crate::stage::TableStage;
use mediclean_core::schema::NOTES;
use mediclean_core::{Error, RecordTable, Result};
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Column holding lowercased, punctuation-free (and later lemmatized) notes
pub const CLEANED_NOTES: &str = "Cleaned_Notes";

/// Replaces missing or blank notes with a fixed sentinel
pub struct FillMissingNotes {
    sentinel: String,
}

impl FillMissingNotes {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }
}

impl TableStage for FillMissingNotes {
    fn apply(&self, table: &mut RecordTable) -> Result<()> {
        let mut filled = 0usize;
        table.map_column(NOTES, NOTES, |cell| match cell {
            Some(text) if !text.trim().is_empty() => Some(text.to_string()),
            _ => {
                filled += 1;
                Some(self.sentinel.clone())
            }
        })?;
        debug!(filled, "Filled missing notes");
        Ok(())
    }

    fn name(&self) -> &str {
        "fill_missing"
    }

    fn artifact_name(&self) -> &str {
        "Filled_missing.csv"
    }
}

/// Lowercases notes and deletes everything but ASCII letters, digits and whitespace
pub struct CleanNotes {
    strip_regex: Regex,
}

impl CleanNotes {
    pub fn new() -> Result<Self> {
        Ok(Self {
            strip_regex: Regex::new(r"[^a-z0-9\s]")
                .map_err(|e| Error::data(format!("Failed to compile cleaning regex: {}", e)))?,
        })
    }

    /// Clean a single note
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        self.strip_regex.replace_all(&lowered, "").into_owned()
    }
}

impl TableStage for CleanNotes {
    fn apply(&self, table: &mut RecordTable) -> Result<()> {
        table.map_column(NOTES, CLEANED_NOTES, |cell| {
            Some(self.clean(cell.unwrap_or_default()))
        })
    }

    fn name(&self) -> &str {
        "clean"
    }

    fn artifact_name(&self) -> &str {
        "cleaned_medical_data.csv"
    }
}

/// Replaces each cleaned token by its base form
pub struct LemmatizeNotes {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl LemmatizeNotes {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }
}

impl Default for LemmatizeNotes {
    fn default() -> Self {
        Self::new(Arc::new(RuleLemmatizer::new()))
    }
}

impl TableStage for LemmatizeNotes {
    fn apply(&self, table: &mut RecordTable) -> Result<()> {
        debug!(model = self.lemmatizer.name(), "Lemmatizing notes");
        table.map_column(CLEANED_NOTES, CLEANED_NOTES, |cell| {
            Some(self.lemmatizer.lemmatize_text(cell.unwrap_or_default()))
        })
    }

    fn name(&self) -> &str {
        "lemmatize"
    }

    fn artifact_name(&self) -> &str {
        "lemmatized.csv"
    }
}
