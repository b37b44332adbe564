//! testweave: bootstrap functional UI test suites from a tabular data export
//! and a snapshot of the rendered interface.
//!
//! The pipeline has four stages, leaf-first:
//!
//! 1. [`data`] classifies records into typed field descriptors.
//! 2. [`ui`] classifies a markup/DOM snapshot into typed UI element descriptors.
//! 3. [`matcher`] pairs the two sets into confidence-scored connections.
//! 4. [`synthesis`] turns connections (or, in degraded mode, UI descriptors
//!    alone) into concrete test cases.
//!
//! The stages are synchronous and pure. [`learner`] wraps them with the
//! external collaborators from [`sources`] under timeouts and a run budget.

pub mod config;
pub mod data;
pub mod error;
pub mod learner;
pub mod matcher;
pub mod sources;
pub mod synthesis;
pub mod types;
pub mod ui;

pub use config::{
    ClassifierThresholds, LearnerConfig, MatchWeights, SynthesisOptions, TimeoutConfig,
};
pub use data::{classify_data, DataPatternClassifier};
pub use error::{ConfigError, LayerError, SourceError, SourceResult};
pub use learner::{
    CallStatus, CollaboratorCall, ConnectionLearner, LearningReport, RunContext, RunOutcome,
};
pub use matcher::{match_connections, ConnectionMatcher};
pub use sources::{
    AuxiliaryRanker, MarkupSnapshotSource, NoRanker, StaticRecords, StaticSnapshot,
    TabularDataSource,
};
pub use synthesis::{rank_cases, synthesize, synthesize_from_ui, TestSynthesizer};
pub use types::*;
pub use ui::{classify_ui, DomNode, MarkupSnapshot, UiPatternClassifier};
