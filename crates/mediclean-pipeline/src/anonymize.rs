//! Denylist anonymizer
//!
//! Redacts a small, fixed set of identifying words. This is not a general
//! PII detector: identifiers outside the list pass through untouched.

use crate::normalize::CLEANED_NOTES;
use crate::stage::TableStage;
use mediclean_core::{Error, RecordTable, Result};
use regex::Regex;
use tracing::debug;

/// Column holding redacted notes
pub const ANONYMIZED_NOTES: &str = "Anonymized_Notes";

/// Replacement token for every redacted word
pub const REDACTION: &str = "REDACTED";

/// Words redacted wherever they appear as a whole word, in any case.
/// `dr` is the `Dr.` title after the cleaner has removed the period.
pub const DENYLIST: &[&str] = &["john", "mary", "dr", "hospital", "phone"];

/// Whole-word, case-insensitive denylist redaction
pub struct Anonymizer {
    denylist_regex: Regex,
}

impl Anonymizer {
    /// Create an anonymizer over [`DENYLIST`]
    pub fn new() -> Result<Self> {
        let alternation = DENYLIST
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            denylist_regex: Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
                .map_err(|e| Error::data(format!("Failed to compile denylist regex: {}", e)))?,
        })
    }

    /// Redact a single note
    pub fn redact(&self, text: &str) -> String {
        self.denylist_regex.replace_all(text, REDACTION).into_owned()
    }

    /// Count denylisted words in a note
    pub fn count_matches(&self, text: &str) -> usize {
        self.denylist_regex.find_iter(text).count()
    }
}

impl TableStage for Anonymizer {
    fn apply(&self, table: &mut RecordTable) -> Result<()> {
        let mut redactions = 0usize;
        table.map_column(CLEANED_NOTES, ANONYMIZED_NOTES, |cell| {
            let text = cell.unwrap_or_default();
            redactions += self.count_matches(text);
            Some(self.redact(text))
        })?;
        debug!(redactions, "Anonymized notes");
        Ok(())
    }

    fn name(&self) -> &str {
        "anonymize"
    }

    fn artifact_name(&self) -> &str {
        "Anonymization.csv"
    }
}
