//! Run-scoped recorder of intermediate table snapshots

use mediclean_core::{Artifact, RecordTable, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes table snapshots into one directory and remembers them in order
#[derive(Debug)]
pub struct ArtifactRecorder {
    output_dir: PathBuf,
    artifacts: Vec<Artifact>,
}

impl ArtifactRecorder {
    /// Create the recorder, creating `output_dir` if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            artifacts: Vec::new(),
        })
    }

    /// Write `table` as `output_dir/name`
    ///
    /// Recording an existing name overwrites the file but keeps its original
    /// position in the list.
    pub fn record(&mut self, table: &RecordTable, name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        table.write_path(&path)?;

        if !self.artifacts.iter().any(|a| a.name == name) {
            self.artifacts.push(Artifact {
                name: name.to_string(),
                path: path.clone(),
            });
        }

        debug!(artifact = name, rows = table.len(), "Recorded artifact");
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Artifacts in recording order
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> RecordTable {
        RecordTable::new(
            vec!["Notes".into(), "Life Threats".into()],
            vec![vec![Some("pain".into()), None]],
        )
        .unwrap()
    }

    #[test]
    fn test_record_writes_csv_with_empty_missing_cells() {
        let dir = TempDir::new().unwrap();
        let mut recorder = ArtifactRecorder::new(dir.path().join("run")).unwrap();
        let path = recorder.record(&table(), "lemmatized.csv").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Notes,Life Threats\npain,\n");
        assert_eq!(recorder.artifacts().len(), 1);
        assert_eq!(recorder.artifacts()[0].path, path);
    }

    #[test]
    fn test_rerecording_keeps_one_entry() {
        let dir = TempDir::new().unwrap();
        let mut recorder = ArtifactRecorder::new(dir.path()).unwrap();
        recorder.record(&table(), "a.csv").unwrap();
        recorder.record(&table(), "b.csv").unwrap();
        recorder.record(&table(), "a.csv").unwrap();

        let names: Vec<String> = recorder.into_artifacts().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["a.csv", "b.csv"]);
    }
}
