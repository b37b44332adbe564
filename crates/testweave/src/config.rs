//! Tunable thresholds, weights and time limits for a learning run.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! needs to name the values it overrides.

use crate::error::ConfigError;
use crate::matcher::DEFAULT_MIN_SAMPLES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds used by the data classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Minimum non-empty samples before a field is described at all.
    /// Never below [`DEFAULT_MIN_SAMPLES`].
    pub min_samples: usize,
    /// Distinct values must stay below this share of the samples to be categorical.
    pub categorical_max_ratio: f64,
    /// Distinct values must stay below this count to be categorical.
    pub categorical_max_distinct: usize,
    /// Uniqueness ratio above which a field is an identifier.
    pub identifier_min_uniqueness: f64,
    /// Exclusive bounds on the mean length of searchable text.
    pub searchable_min_avg_length: f64,
    pub searchable_max_avg_length: f64,
    /// Representative values kept for searchable fields.
    pub searchable_sample_size: usize,
    /// Share of samples that must parse as numbers.
    pub numeric_min_ratio: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_SAMPLES,
            categorical_max_ratio: 0.8,
            categorical_max_distinct: 50,
            identifier_min_uniqueness: 0.9,
            searchable_min_avg_length: 2.0,
            searchable_max_avg_length: 200.0,
            searchable_sample_size: 5,
            numeric_min_ratio: 0.8,
        }
    }
}

/// Per-signal confidence weights used by the connection matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    pub categorical_base: f32,
    pub categorical_dropdown: f32,
    pub categorical_checkbox: f32,
    pub categorical_name_in_selector: f32,
    pub categorical_distinct_in_range: f32,
    /// Inclusive distinct-count range that earns `categorical_distinct_in_range`.
    pub categorical_distinct_range: (usize, usize),
    pub search_base: f32,
    pub search_exact_type: f32,
    pub search_name_match: f32,
    pub search_length_in_range: f32,
    /// Inclusive mean-length range that earns `search_length_in_range`.
    pub search_length_range: (f64, f64),
    pub numerical_fixed: f32,
    pub sortable_fixed: f32,
    /// Pairs must score strictly above this to be kept.
    pub min_confidence: f32,
    /// Concrete values attached to categorical and search connections.
    pub test_value_count: usize,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            categorical_base: 0.4,
            categorical_dropdown: 0.3,
            categorical_checkbox: 0.2,
            categorical_name_in_selector: 0.3,
            categorical_distinct_in_range: 0.1,
            categorical_distinct_range: (2, 20),
            search_base: 0.5,
            search_exact_type: 0.3,
            search_name_match: 0.2,
            search_length_in_range: 0.1,
            search_length_range: (3.0, 50.0),
            numerical_fixed: 0.7,
            sortable_fixed: 0.8,
            min_confidence: 0.2,
            test_value_count: 3,
        }
    }
}

/// Selection applied by the synthesizer before emitting test cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Keep only the best connection per (type, field).
    pub dedupe_by_field: bool,
    /// Cap on connections used per connection type.
    pub max_per_type: Option<usize>,
}

/// Time limits for external collaborator calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub per_call_ms: u64,
    pub total_budget_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            per_call_ms: 15_000,
            total_budget_ms: 60_000,
        }
    }
}

impl TimeoutConfig {
    pub fn per_call(&self) -> Duration {
        Duration::from_millis(self.per_call_ms)
    }

    pub fn total_budget(&self) -> Duration {
        Duration::from_millis(self.total_budget_ms)
    }
}

/// Full configuration for a learning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub classifier: ClassifierThresholds,
    pub matcher: MatchWeights,
    pub synthesis: SynthesisOptions,
    pub timeouts: TimeoutConfig,
}

impl LearnerConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        if c.min_samples < DEFAULT_MIN_SAMPLES {
            return Err(ConfigError::Invalid {
                key: "classifier.min_samples",
                reason: format!("must be at least {DEFAULT_MIN_SAMPLES}"),
            });
        }
        for (key, ratio) in [
            ("classifier.categorical_max_ratio", c.categorical_max_ratio),
            (
                "classifier.identifier_min_uniqueness",
                c.identifier_min_uniqueness,
            ),
            ("classifier.numeric_min_ratio", c.numeric_min_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{ratio} is outside [0, 1]"),
                });
            }
        }
        if c.searchable_min_avg_length >= c.searchable_max_avg_length {
            return Err(ConfigError::Invalid {
                key: "classifier.searchable_min_avg_length",
                reason: "must be below searchable_max_avg_length".to_string(),
            });
        }

        let m = &self.matcher;
        for (key, weight) in [
            ("matcher.categorical_base", m.categorical_base),
            ("matcher.search_base", m.search_base),
            ("matcher.numerical_fixed", m.numerical_fixed),
            ("matcher.sortable_fixed", m.sortable_fixed),
            ("matcher.min_confidence", m.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{weight} is outside [0, 1]"),
                });
            }
        }
        if m.test_value_count == 0 {
            return Err(ConfigError::Invalid {
                key: "matcher.test_value_count",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.timeouts.per_call_ms == 0 || self.timeouts.total_budget_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "timeouts",
                reason: "timeouts must be positive".to_string(),
            });
        }
        Ok(())
    }
}
