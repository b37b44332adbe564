//! Learning run: drives the collaborators under time limits and feeds the
//! four pipeline stages.
//!
//! Collaborator failures never abort a run. A failed or timed-out markup
//! fetch leaves the run with data only, a missing data source switches to
//! degraded (UI-only) synthesis, and a missing ranking keeps input order.
//! Only when neither input is usable does the run report `Empty`.

use crate::config::LearnerConfig;
use crate::data::DataPatternClassifier;
use crate::error::{SourceError, SourceResult};
use crate::matcher::ConnectionMatcher;
use crate::sources::{AuxiliaryRanker, MarkupSnapshotSource, TabularDataSource};
use crate::synthesis::TestSynthesizer;
use crate::types::*;
use crate::ui::{MarkupSnapshot, UiPatternClassifier};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

const MARKUP_SOURCE: &str = "markup_source";
const DATA_SOURCE: &str = "data_source";
const RANKER: &str = "ranker";

/// How a collaborator call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Ok,
    Failed,
    TimedOut,
    Skipped,
}

/// One entry of the run's call log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollaboratorCall {
    pub collaborator: String,
    pub status: CallStatus,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Caller-owned state for one run: the call log, the last ranking received
/// and the wall-clock budget.
#[derive(Debug, Clone)]
pub struct RunContext {
    calls: Vec<CollaboratorCall>,
    last_ranking: Option<Vec<String>>,
    started: Instant,
    budget: Duration,
}

impl RunContext {
    pub fn new(budget: Duration) -> Self {
        Self {
            calls: Vec::new(),
            last_ranking: None,
            started: Instant::now(),
            budget,
        }
    }

    pub fn calls(&self) -> &[CollaboratorCall] {
        &self.calls
    }

    pub fn last_ranking(&self) -> Option<&[String]> {
        self.last_ranking.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// Effective limit for the next call, or `None` once the budget is spent.
    fn call_limit(&self, per_call: Duration) -> Option<Duration> {
        let remaining = self.remaining();
        (!remaining.is_zero()).then(|| per_call.min(remaining))
    }

    fn record(
        &mut self,
        collaborator: &str,
        status: CallStatus,
        elapsed: Duration,
        detail: Option<String>,
    ) {
        self.calls.push(CollaboratorCall {
            collaborator: collaborator.to_string(),
            status,
            elapsed_ms: elapsed.as_millis() as u64,
            detail,
        });
    }
}

/// How complete a run's output is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Complete,
    Degraded { reasons: Vec<String> },
    Empty { reason: String },
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct LearningReport {
    pub outcome: RunOutcome,
    pub degraded_mode: bool,
    pub data: DataPatterns,
    pub ui: UiPatterns,
    pub connections: Connections,
    pub test_cases: Vec<TestCase>,
    pub calls: Vec<CollaboratorCall>,
}

impl LearningReport {
    fn empty(reason: impl Into<String>, ctx: &RunContext) -> Self {
        Self {
            outcome: RunOutcome::Empty {
                reason: reason.into(),
            },
            degraded_mode: false,
            data: DataPatterns::default(),
            ui: UiPatterns::default(),
            connections: Connections::default(),
            test_cases: Vec::new(),
            calls: ctx.calls.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.outcome, RunOutcome::Empty { .. })
    }
}

/// Orchestrates one learning run over pluggable collaborators.
pub struct ConnectionLearner {
    markup_source: Arc<dyn MarkupSnapshotSource>,
    data_source: Option<Arc<dyn TabularDataSource>>,
    ranker: Option<Arc<dyn AuxiliaryRanker>>,
    config: LearnerConfig,
}

impl ConnectionLearner {
    pub fn new(markup_source: Arc<dyn MarkupSnapshotSource>) -> Self {
        Self {
            markup_source,
            data_source: None,
            ranker: None,
            config: LearnerConfig::default(),
        }
    }

    pub fn with_data_source(mut self, source: Arc<dyn TabularDataSource>) -> Self {
        self.data_source = Some(source);
        self
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn AuxiliaryRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    pub fn with_config(mut self, config: LearnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// A fresh context carrying this learner's total budget.
    pub fn new_context(&self) -> RunContext {
        RunContext::new(self.config.timeouts.total_budget())
    }

    /// Run the pipeline once. Never fails: problems show up in the outcome
    /// and in the context's call log.
    pub async fn run(&self, ctx: &mut RunContext) -> LearningReport {
        let snapshot = self
            .call(ctx, MARKUP_SOURCE, self.markup_source.snapshot())
            .await
            .filter(|s| !s.is_blank());

        let records = match &self.data_source {
            Some(source) => self
                .call(ctx, DATA_SOURCE, source.records())
                .await
                .unwrap_or_default(),
            None => Vec::new(),
        };

        if snapshot.is_none() && records.is_empty() {
            tracing::warn!("learner: neither markup nor tabular data is available");
            return LearningReport::empty("no usable markup snapshot or tabular data", ctx);
        }

        let mut reasons = Vec::new();
        if snapshot.is_none() {
            reasons.push("markup snapshot unavailable".to_string());
        }
        let degraded_mode = records.is_empty();
        if degraded_mode {
            reasons.push("no tabular data; test cases derived from UI only".to_string());
        }

        let (data, ui) = match self.classify(records, snapshot).await {
            Ok(patterns) => patterns,
            Err(e) => {
                tracing::warn!("learner: classification task failed: {e}");
                return LearningReport::empty(format!("classification failed: {e}"), ctx);
            }
        };
        if data.is_empty() && ui.is_empty() {
            return LearningReport::empty("no field or UI patterns were recognised", ctx);
        }
        if ui.is_empty() {
            reasons.push("no UI elements detected".to_string());
        }

        let ranking = match &self.ranker {
            Some(ranker) => {
                let summary = data.summary();
                let ranking = self.call(ctx, RANKER, ranker.rank(&ui, &summary)).await;
                if ranking.is_none() {
                    reasons.push("ranking unavailable; input order kept".to_string());
                }
                ranking
            }
            None => None,
        };
        if let Some(ranking) = &ranking {
            ctx.last_ranking = Some(ranking.clone());
        }

        let synthesizer = TestSynthesizer::new(self.config.synthesis.clone());
        let (connections, test_cases) = if degraded_mode {
            let cases = synthesizer.synthesize_from_ui(&ui, ranking.as_deref());
            (Connections::default(), cases)
        } else {
            let connections = ConnectionMatcher::new(self.config.matcher.clone())
                .with_min_samples(self.config.classifier.min_samples)
                .match_all(&data, &ui);
            let cases = synthesizer.synthesize(&connections, ranking.as_deref());
            (connections, cases)
        };

        let outcome = if reasons.is_empty() {
            RunOutcome::Complete
        } else {
            RunOutcome::Degraded { reasons }
        };
        tracing::info!(
            "learner: {} connections, {} test cases in {} ms",
            connections.len(),
            test_cases.len(),
            ctx.elapsed().as_millis()
        );

        LearningReport {
            outcome,
            degraded_mode,
            data,
            ui,
            connections,
            test_cases,
            calls: ctx.calls.clone(),
        }
    }

    /// Both classifiers on the blocking pool, side by side. The parsed DOM
    /// is built and dropped inside the task.
    async fn classify(
        &self,
        records: Vec<Record>,
        snapshot: Option<MarkupSnapshot>,
    ) -> Result<(DataPatterns, UiPatterns), tokio::task::JoinError> {
        let thresholds = self.config.classifier.clone();
        tokio::task::spawn_blocking(move || {
            rayon::join(
                || DataPatternClassifier::new(thresholds).classify(&records),
                || match &snapshot {
                    Some(snapshot) => UiPatternClassifier::default().classify(snapshot),
                    None => UiPatterns::default(),
                },
            )
        })
        .await
    }

    /// Await one collaborator call under the per-call limit and the
    /// remaining budget, logging the result into `ctx`.
    async fn call<T, F>(&self, ctx: &mut RunContext, collaborator: &str, call: F) -> Option<T>
    where
        F: Future<Output = SourceResult<T>>,
    {
        let Some(limit) = ctx.call_limit(self.config.timeouts.per_call()) else {
            let e = SourceError::BudgetExhausted(collaborator.to_string());
            tracing::warn!("learner: {e}");
            ctx.record(collaborator, CallStatus::Skipped, Duration::ZERO, Some(e.to_string()));
            return None;
        };

        let started = Instant::now();
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => {
                ctx.record(collaborator, CallStatus::Ok, started.elapsed(), None);
                Some(value)
            }
            Ok(Err(e)) => {
                tracing::warn!("learner: {collaborator} failed: {e}");
                let elapsed = started.elapsed();
                ctx.record(collaborator, CallStatus::Failed, elapsed, Some(e.to_string()));
                None
            }
            Err(_) => {
                let e = SourceError::Timeout {
                    collaborator: collaborator.to_string(),
                    after_ms: limit.as_millis() as u64,
                };
                tracing::warn!("learner: {e}");
                let elapsed = started.elapsed();
                ctx.record(collaborator, CallStatus::TimedOut, elapsed, Some(e.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{StaticRecords, StaticSnapshot};
    use async_trait::async_trait;

    struct FailingSnapshot;

    #[async_trait]
    impl MarkupSnapshotSource for FailingSnapshot {
        async fn snapshot(&self) -> SourceResult<MarkupSnapshot> {
            Err(SourceError::Unavailable("browser bridge down".to_string()))
        }
    }

    fn records() -> Vec<Record> {
        ["Labrador", "Poodle", "Boxer", "Poodle", "Labrador", "Boxer"]
            .iter()
            .map(|breed| Record::from([("breed".to_string(), breed.to_string())]))
            .collect()
    }

    #[test]
    fn test_call_limit_respects_budget() {
        let ctx = RunContext::new(Duration::from_millis(100));
        let limit = ctx.call_limit(Duration::from_secs(15)).unwrap();
        assert!(limit <= Duration::from_millis(100));

        let spent = RunContext::new(Duration::ZERO);
        assert!(spent.call_limit(Duration::from_secs(15)).is_none());
    }

    #[tokio::test]
    async fn test_complete_run() {
        let learner = ConnectionLearner::new(Arc::new(StaticSnapshot::markup(
            r#"<select id="breed-filter">
                 <option>Labrador</option><option>Poodle</option>
               </select>"#,
        )))
        .with_data_source(Arc::new(StaticRecords::new(records())));
        let mut ctx = learner.new_context();
        let report = learner.run(&mut ctx).await;

        assert_eq!(report.outcome, RunOutcome::Complete);
        assert!(!report.degraded_mode);
        assert_eq!(report.connections.categorical_filter.len(), 1);
        assert!(!report.test_cases.is_empty());
        assert_eq!(ctx.calls().len(), 2);
        assert!(ctx.calls().iter().all(|c| c.status == CallStatus::Ok));
    }

    #[tokio::test]
    async fn test_failed_markup_with_data_is_degraded() {
        let learner = ConnectionLearner::new(Arc::new(FailingSnapshot))
            .with_data_source(Arc::new(StaticRecords::new(records())));
        let mut ctx = learner.new_context();
        let report = learner.run(&mut ctx).await;

        assert!(matches!(report.outcome, RunOutcome::Degraded { .. }));
        assert!(report.connections.is_empty());
        assert!(report.test_cases.is_empty());
        assert_eq!(ctx.calls()[0].status, CallStatus::Failed);
    }

    #[tokio::test]
    async fn test_nothing_usable_is_empty() {
        let learner = ConnectionLearner::new(Arc::new(FailingSnapshot));
        let mut ctx = learner.new_context();
        let report = learner.run(&mut ctx).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_spent_budget_skips_calls() {
        let snapshot = StaticSnapshot::markup("<button>Go</button>");
        let learner = ConnectionLearner::new(Arc::new(snapshot));
        let mut ctx = RunContext::new(Duration::ZERO);
        let report = learner.run(&mut ctx).await;
        assert!(report.is_empty());
        assert_eq!(ctx.calls()[0].status, CallStatus::Skipped);
    }
}
