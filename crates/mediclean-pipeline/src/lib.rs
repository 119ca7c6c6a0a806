//! MediClean Pipeline
//!
//! Prepares uploaded medical-record tables and trains two classifiers on them.
//!
//! A run moves through two phases:
//! - Table stages (fill, clean, lemmatize, anonymize, label), each followed by
//!   a CSV snapshot that callers can download
//! - Modelling: TF-IDF features, SMOTE balancing, a seeded 80/20 split, then a
//!   random forest and an RBF support vector classifier scored on the same
//!   held-out rows
//!
//! Every step is deterministic for a given input and configuration.

pub mod anonymize;
pub mod artifacts;
pub mod balance;
pub mod config;
pub mod features;
pub mod label;
pub mod lemmatizer;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod split;
pub mod stage;
pub mod trainer;

pub use anonymize::Anonymizer;
pub use artifacts::ArtifactRecorder;
pub use balance::{BalancedDataset, Smote};
pub use config::{ForestConfig, PipelineConfig, SmoteConfig, SvmConfig};
pub use features::{FeatureMatrix, TfidfVectorizer};
pub use label::LabelDeriver;
pub use lemmatizer::{Lemmatizer, RuleLemmatizer};
pub use models::{BinaryClassifier, RandomForest, SupportVectorClassifier};
pub use normalize::{CleanNotes, FillMissingNotes, LemmatizeNotes};
pub use pipeline::{run_pipeline, Pipeline};
pub use report::ClassificationReport;
pub use split::{train_test_split, TrainTestSplit};
pub use stage::{StageReport, TableStage};
pub use trainer::{DualPredictions, DualTrainer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::models::BinaryClassifier;
    pub use crate::pipeline::{run_pipeline, Pipeline};
    pub use crate::stage::TableStage;
    pub use mediclean_core::prelude::*;
}
