//! Wiring a learning run from files on disk and wrapping its report.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use testweave::{ConnectionLearner, LearnerConfig, LearningReport};

use crate::sources::{CsvTableSource, FileSnapshotSource};

/// The JSON document printed by `testweave learn`.
#[derive(Debug, Serialize)]
pub struct LearnRun {
    pub generated_at: DateTime<Utc>,
    pub snapshot: PathBuf,
    pub data_files: Vec<PathBuf>,
    #[serde(flatten)]
    pub report: LearningReport,
}

impl LearnRun {
    pub fn new(snapshot: PathBuf, data_files: Vec<PathBuf>, report: LearningReport) -> Self {
        Self {
            generated_at: Utc::now(),
            snapshot,
            data_files,
            report,
        }
    }
}

/// Build a learner over a snapshot file and zero or more CSV tables.
///
/// With no tables the learner has no data source and runs in degraded mode.
pub fn learner_from_files(
    snapshot: PathBuf,
    data_files: &[PathBuf],
    config: LearnerConfig,
) -> ConnectionLearner {
    let learner = ConnectionLearner::new(Arc::new(FileSnapshotSource::new(snapshot)))
        .with_config(config);
    if data_files.is_empty() {
        learner
    } else {
        learner.with_data_source(Arc::new(CsvTableSource::new(data_files.to_vec())))
    }
}
