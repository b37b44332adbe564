//! testweave CLI: file-backed collaborators and config loading for the
//! `testweave` binary.

pub mod config;
pub mod report;
pub mod sources;

pub use config::{load_config, resolve_config_path, ConfigFileError};
pub use report::{learner_from_files, LearnRun};
pub use sources::{parse_csv_records, parse_snapshot_json, CsvTableSource, FileSnapshotSource};
