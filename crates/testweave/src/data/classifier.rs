//! Data pattern classifier: profiles every column of a record set and tags
//! it with the categories it qualifies for.
//!
//! Each column is profiled once (in parallel, order preserved) and then
//! tested independently against six category rules, so one field can be
//! categorical *and* sortable at the same time. Relationships and business
//! rules are inferred over the whole column set and attached afterwards.

use super::relationships::{attach, infer_business_rules, infer_relationships, ColumnFacts};
use super::values::{detect_date_format, parse_date, parse_number};
use crate::config::ClassifierThresholds;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashSet;

/// Everything the category rules need to know about one column.
#[derive(Debug, Clone)]
struct ColumnProfile {
    name: String,
    /// Trimmed non-empty samples in record order.
    samples: Vec<String>,
    /// Distinct samples in first-seen order.
    distinct: Vec<String>,
    /// Samples that parse as finite numbers.
    numbers: Vec<f64>,
    /// Layout of the first sample that looks like a date.
    date_format: Option<DateFormat>,
    avg_length: f64,
}

impl ColumnProfile {
    fn build(name: &str, records: &[Record]) -> Self {
        let samples: Vec<String> = records
            .iter()
            .filter_map(|r| r.get(name))
            .filter(|v| is_concrete_value(v))
            .map(|v| v.trim().to_string())
            .collect();

        let mut seen = HashSet::new();
        let distinct: Vec<String> = samples
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        let numbers: Vec<f64> = samples.iter().filter_map(|s| parse_number(s)).collect();
        let date_format = samples.iter().find_map(|s| detect_date_format(s));

        let avg_length = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.chars().count()).sum::<usize>() as f64 / samples.len() as f64
        };

        Self {
            name: name.to_string(),
            samples,
            distinct,
            numbers,
            date_format,
            avg_length,
        }
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn numeric_share(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.numbers.len() as f64 / self.samples.len() as f64
        }
    }

    fn facts(&self) -> ColumnFacts<'_> {
        let all_numeric = !self.samples.is_empty() && self.numbers.len() == self.samples.len();
        ColumnFacts {
            name: &self.name,
            non_empty: self.samples.len(),
            distinct: self.distinct.len(),
            numeric_bounds: all_numeric.then(|| min_max(&self.numbers)),
        }
    }
}

/// Classifies parsed records into typed field descriptors.
#[derive(Debug, Clone, Default)]
pub struct DataPatternClassifier {
    thresholds: ClassifierThresholds,
}

impl DataPatternClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify a flattened record set. Empty input yields empty patterns.
    pub fn classify(&self, records: &[Record]) -> DataPatterns {
        if records.is_empty() {
            tracing::debug!("data classifier: no records");
            return DataPatterns::default();
        }

        let names = column_names(records);
        if names.is_empty() {
            tracing::debug!("data classifier: records carry no columns");
            return DataPatterns::default();
        }

        let profiles: Vec<ColumnProfile> = names
            .par_iter()
            .map(|name| ColumnProfile::build(name, records))
            .collect();

        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let relationships = infer_relationships(&name_refs);
        let facts: Vec<ColumnFacts<'_>> = profiles.iter().map(ColumnProfile::facts).collect();
        let rules = infer_business_rules(&facts, records.len());

        let described: Vec<Vec<FieldDescriptor>> = profiles
            .par_iter()
            .map(|profile| self.describe(profile, &relationships, &rules))
            .collect();

        let mut patterns = DataPatterns::default();
        for descriptor in described.into_iter().flatten() {
            patterns.push(descriptor);
        }

        tracing::info!(
            "data classifier: {} columns -> {} categorical, {} numerical, {} identifier, \
             {} searchable, {} temporal, {} sortable",
            names.len(),
            patterns.categorical.len(),
            patterns.numerical.len(),
            patterns.identifier.len(),
            patterns.searchable.len(),
            patterns.temporal.len(),
            patterns.sortable.len()
        );

        patterns
    }

    /// Run all six category rules against one column.
    fn describe(
        &self,
        profile: &ColumnProfile,
        relationships: &[String],
        rules: &[String],
    ) -> Vec<FieldDescriptor> {
        let stats = [
            self.categorical(profile),
            self.numerical(profile),
            self.identifier(profile),
            self.searchable(profile),
            self.temporal(profile),
            self.sortable(profile),
        ];

        if stats.iter().all(Option::is_none) {
            tracing::debug!(
                "data classifier: skipping {} ({} samples)",
                profile.name,
                profile.sample_count()
            );
            return Vec::new();
        }

        let field_relationships = attach(&profile.name, relationships);
        let field_rules = attach(&profile.name, rules);

        stats
            .into_iter()
            .flatten()
            .map(|(category, stats)| FieldDescriptor {
                name: profile.name.clone(),
                category,
                sample_count: profile.sample_count(),
                stats,
                relationships: field_relationships.clone(),
                business_rules: field_rules.clone(),
            })
            .collect()
    }

    fn has_min_samples(&self, profile: &ColumnProfile) -> bool {
        profile.sample_count() >= self.thresholds.min_samples
    }

    fn categorical(&self, profile: &ColumnProfile) -> Option<(FieldCategory, FieldStats)> {
        let t = &self.thresholds;
        let distinct = profile.distinct.len();
        let qualifies = self.has_min_samples(profile)
            && distinct > 1
            && (distinct as f64) < t.categorical_max_ratio * profile.sample_count() as f64
            && distinct < t.categorical_max_distinct;
        qualifies.then(|| {
            (
                FieldCategory::Categorical,
                FieldStats::Categorical {
                    distinct_values: profile.distinct.clone(),
                    unique_count: distinct,
                },
            )
        })
    }

    fn numerical(&self, profile: &ColumnProfile) -> Option<(FieldCategory, FieldStats)> {
        let qualifies = profile.numbers.len() >= self.thresholds.min_samples
            && profile.numeric_share() >= self.thresholds.numeric_min_ratio;
        qualifies.then(|| {
            let (min, max) = min_max(&profile.numbers);
            let mean = profile.numbers.iter().sum::<f64>() / profile.numbers.len() as f64;
            (
                FieldCategory::Numerical,
                FieldStats::Numerical { min, max, mean },
            )
        })
    }

    fn identifier(&self, profile: &ColumnProfile) -> Option<(FieldCategory, FieldStats)> {
        if !self.has_min_samples(profile) {
            return None;
        }
        let uniqueness = profile.distinct.len() as f64 / profile.sample_count() as f64;
        (uniqueness > self.thresholds.identifier_min_uniqueness).then_some((
            FieldCategory::Identifier,
            FieldStats::Identifier { uniqueness },
        ))
    }

    fn searchable(&self, profile: &ColumnProfile) -> Option<(FieldCategory, FieldStats)> {
        let t = &self.thresholds;
        let qualifies = self.has_min_samples(profile)
            && profile.avg_length > t.searchable_min_avg_length
            && profile.avg_length < t.searchable_max_avg_length;
        qualifies.then(|| {
            (
                FieldCategory::Searchable,
                FieldStats::Searchable {
                    avg_length: profile.avg_length,
                    sample_values: profile
                        .distinct
                        .iter()
                        .take(t.searchable_sample_size)
                        .cloned()
                        .collect(),
                },
            )
        })
    }

    fn temporal(&self, profile: &ColumnProfile) -> Option<(FieldCategory, FieldStats)> {
        let format = profile.date_format?;
        let dates: Vec<_> = profile
            .samples
            .iter()
            .filter_map(|s| parse_date(s, format))
            .collect();
        Some((
            FieldCategory::Temporal,
            FieldStats::Temporal {
                format,
                earliest: dates.iter().min().copied(),
                latest: dates.iter().max().copied(),
            },
        ))
    }

    fn sortable(&self, profile: &ColumnProfile) -> Option<(FieldCategory, FieldStats)> {
        if !self.has_min_samples(profile) {
            return None;
        }
        let data_type = if profile.numeric_share() >= self.thresholds.numeric_min_ratio {
            PrimitiveType::Number
        } else if profile.date_format.is_some() {
            PrimitiveType::Date
        } else {
            PrimitiveType::String
        };
        Some((FieldCategory::Sortable, FieldStats::Sortable { data_type }))
    }
}

/// Classify records with default thresholds.
pub fn classify_data(records: &[Record]) -> DataPatterns {
    DataPatternClassifier::default().classify(records)
}

/// Column names in first-seen order across the record sequence.
fn column_names(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in records {
        for key in record.keys() {
            if !key.trim().is_empty() && seen.insert(key.as_str()) {
                names.push(key.clone());
            }
        }
    }
    names
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
