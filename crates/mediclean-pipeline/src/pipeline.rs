//! End-to-end preparation and training run
//!
//! A run loads the uploaded table, passes it through the table stages in a
//! fixed order (recording a snapshot after each), then extracts features,
//! balances classes, trains both classifiers and reports their metrics.

use crate::anonymize::{Anonymizer, ANONYMIZED_NOTES};
use crate::artifacts::ArtifactRecorder;
use crate::balance::Smote;
use crate::config::PipelineConfig;
use crate::features::TfidfVectorizer;
use crate::label::LabelDeriver;
use crate::normalize::{CleanNotes, FillMissingNotes, LemmatizeNotes};
use crate::report::build_report;
use crate::stage::{StageReport, TableStage};
use crate::trainer::DualTrainer;
use mediclean_core::{Error, PipelineResult, RecordTable, Result, Schema};
use ndarray::Array1;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Snapshot name of the table as loaded, before any stage runs
pub const INGESTED_ARTIFACT: &str = "Duplicate_Removed.csv";

/// Ordered table stages plus the modelling configuration
pub struct Pipeline {
    config: PipelineConfig,
    schema: Schema,
    stages: Vec<Box<dyn TableStage>>,
}

impl Pipeline {
    /// Build the standard stage sequence for `config`
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let stages: Vec<Box<dyn TableStage>> = vec![
            Box::new(FillMissingNotes::new(config.notes_sentinel.clone())),
            Box::new(CleanNotes::new()?),
            Box::new(LemmatizeNotes::default()),
            Box::new(Anonymizer::new()?),
            Box::new(LabelDeriver::new()?),
        ];

        Ok(Self {
            config,
            schema: Schema::medical_records(),
            stages,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run on the CSV at `file_path`, writing artifacts into `output_dir`
    pub fn run(
        &self,
        file_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        metrics::counter!("mediclean_runs_total").increment(1);

        let result = self.execute(file_path.as_ref(), output_dir.as_ref());
        match &result {
            Ok(_) => info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Pipeline run completed"
            ),
            Err(e) => {
                metrics::counter!("mediclean_run_failures_total", "kind" => e.kind()).increment(1);
                warn!(error = %e, kind = e.kind(), "Pipeline run failed");
            }
        }
        result
    }

    fn execute(&self, file_path: &Path, output_dir: &Path) -> Result<PipelineResult> {
        info!(
            input = %file_path.display(),
            output = %output_dir.display(),
            "Starting pipeline run"
        );

        let mut table = RecordTable::from_path(file_path)?;
        table.trim_headers();
        self.schema.validate(&table)?;

        let mut recorder = ArtifactRecorder::new(output_dir)?;
        recorder.record(&table, INGESTED_ARTIFACT)?;

        for stage in &self.stages {
            let report = self.apply_stage(stage.as_ref(), &mut table)?;
            debug!(
                stage = %report.stage,
                rows = report.rows,
                latency_us = report.latency_us,
                "Stage completed"
            );
            recorder.record(&table, stage.artifact_name())?;
        }

        let documents: Vec<&str> = table
            .cells(ANONYMIZED_NOTES)?
            .map(|cell| cell.unwrap_or(""))
            .collect();
        let labels = Array1::from(LabelDeriver::labels(&table)?);

        let matrix = TfidfVectorizer::new(self.config.max_features)?.fit_transform(&documents)?;
        if matrix.n_samples() != labels.len() || labels.len() != table.len() {
            return Err(Error::data(format!(
                "row count mismatch: {} feature rows, {} labels, {} records",
                matrix.n_samples(),
                labels.len(),
                table.len()
            )));
        }
        info!(
            documents = matrix.n_samples(),
            vocabulary = matrix.n_features(),
            "Extracted features"
        );

        let balanced =
            Smote::from_config(&self.config.smote).fit_resample(&matrix.features, &labels)?;
        info!(
            samples = balanced.n_samples(),
            synthetic = balanced.synthetic,
            "Balanced dataset"
        );

        let predictions = DualTrainer::new(&self.config).train_and_predict(&balanced)?;
        let report = build_report(
            &predictions.y_test,
            &predictions.classifier_a,
            &predictions.classifier_b,
        )?;

        Ok(PipelineResult::new(recorder.into_artifacts(), report))
    }

    fn apply_stage(&self, stage: &dyn TableStage, table: &mut RecordTable) -> Result<StageReport> {
        let rows_before = table.len();
        let start = Instant::now();
        stage.apply(table)?;
        let latency_us = start.elapsed().as_micros() as u64;

        metrics::histogram!("mediclean_stage_latency_us", "stage" => stage.name().to_string())
            .record(latency_us as f64);

        if table.len() != rows_before {
            return Err(Error::data(format!(
                "stage {} changed the row count from {} to {}",
                stage.name(),
                rows_before,
                table.len()
            )));
        }

        Ok(StageReport {
            stage: stage.name().to_string(),
            rows: table.len(),
            latency_us,
        })
    }
}

/// Run the standard pipeline once
pub fn run_pipeline(
    file_path: impl AsRef<Path>,
    config: &PipelineConfig,
    output_dir: impl AsRef<Path>,
) -> Result<PipelineResult> {
    Pipeline::new(config.clone())?.run(file_path, output_dir)
}
