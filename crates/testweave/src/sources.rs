//! External collaborators consumed by a learning run.
//!
//! The core never fetches anything itself; callers plug in implementations
//! of these traits (a browser bridge, a file loader, an LLM ranker).

use crate::error::{SourceError, SourceResult};
use crate::types::{FieldSummary, Record, UiPatterns};
use crate::ui::MarkupSnapshot;
use async_trait::async_trait;

/// Supplies the tabular export, already flattened across tables.
#[async_trait]
pub trait TabularDataSource: Send + Sync {
    async fn records(&self) -> SourceResult<Vec<Record>>;
}

/// Supplies a snapshot of the rendered interface.
#[async_trait]
pub trait MarkupSnapshotSource: Send + Sync {
    async fn snapshot(&self) -> SourceResult<MarkupSnapshot>;
}

/// Optional ranking of UI selectors by test priority. The run must complete
/// without it.
#[async_trait]
pub trait AuxiliaryRanker: Send + Sync {
    async fn rank(&self, ui: &UiPatterns, fields: &FieldSummary) -> SourceResult<Vec<String>>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticRecords {
    records: Vec<Record>,
}

impl StaticRecords {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TabularDataSource for StaticRecords {
    async fn records(&self) -> SourceResult<Vec<Record>> {
        Ok(self.records.clone())
    }
}

/// A snapshot held in memory.
#[derive(Debug, Clone)]
pub struct StaticSnapshot {
    snapshot: MarkupSnapshot,
}

impl StaticSnapshot {
    pub fn new(snapshot: MarkupSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn markup(markup: impl Into<String>) -> Self {
        Self::new(MarkupSnapshot::Markup(markup.into()))
    }
}

#[async_trait]
impl MarkupSnapshotSource for StaticSnapshot {
    async fn snapshot(&self) -> SourceResult<MarkupSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// A ranker that always reports itself unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRanker;

#[async_trait]
impl AuxiliaryRanker for NoRanker {
    async fn rank(&self, _ui: &UiPatterns, _fields: &FieldSummary) -> SourceResult<Vec<String>> {
        Err(SourceError::Unavailable("no ranker configured".to_string()))
    }
}
