//! Connection matcher: pairs classified data fields with classified UI
//! elements and scores each pairing.
//!
//! Four independent rules, one per connection type. Every candidate pair is
//! validated first (enough samples on the field, a usable selector on the
//! element); the matcher never ranks pairs against each other.

use crate::config::MatchWeights;
use crate::data::values::format_number;
use crate::types::*;

/// Fewest non-empty samples a field needs before it may be connected.
pub const DEFAULT_MIN_SAMPLES: usize = 3;

/// Scores data-field × UI-element pairs.
#[derive(Debug, Clone)]
pub struct ConnectionMatcher {
    weights: MatchWeights,
    min_samples: usize,
}

impl Default for ConnectionMatcher {
    fn default() -> Self {
        Self::new(MatchWeights::default())
    }
}

impl ConnectionMatcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self {
            weights,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }

    /// Raise the sample bar. Values below [`DEFAULT_MIN_SAMPLES`] are ignored.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples.max(DEFAULT_MIN_SAMPLES);
        self
    }

    /// Match every rule. Empty input on either side yields empty lists.
    pub fn match_all(&self, data: &DataPatterns, ui: &UiPatterns) -> Connections {
        let connections = Connections {
            categorical_filter: self.categorical_filters(data, ui),
            searchable_search: self.searchable_search(data, ui),
            numerical_filter: self.numerical_filters(data, ui),
            sortable_sort: self.sortable_sort(data, ui),
        };
        tracing::info!(
            "matcher: {} categorical_filter, {} searchable_search, \
             {} numerical_filter, {} sortable_sort",
            connections.categorical_filter.len(),
            connections.searchable_search.len(),
            connections.numerical_filter.len(),
            connections.sortable_sort.len()
        );
        connections
    }

    fn valid_pair(&self, field: &FieldDescriptor, element: &UiElementDescriptor) -> bool {
        if field.sample_count < self.min_samples {
            tracing::debug!(
                "matcher: skipping {} ({} samples, need {})",
                field.name,
                field.sample_count,
                self.min_samples
            );
            return false;
        }
        if !element.has_valid_selector() {
            tracing::debug!("matcher: skipping element with selector {:?}", element.selector);
            return false;
        }
        true
    }

    /// Keep a scored pair only above the minimum; scores are capped at 1.0.
    fn accept(
        &self,
        field: &FieldDescriptor,
        element: &UiElementDescriptor,
        connection_type: ConnectionType,
        score: f32,
        test_values: Vec<String>,
    ) -> Option<Connection> {
        let confidence = score.clamp(0.0, 1.0);
        if confidence <= self.weights.min_confidence {
            tracing::debug!(
                "matcher: {} × {} scored {confidence:.2}, below minimum",
                field.name,
                element.selector
            );
            return None;
        }
        if test_values.is_empty() {
            tracing::debug!(
                "matcher: {} × {} has no concrete test values",
                field.name,
                element.selector
            );
            return None;
        }
        Some(Connection {
            data_field: field.name.clone(),
            ui_element: element.selector.clone(),
            ui_kind: element.kind,
            connection_type,
            confidence,
            test_values,
        })
    }

    fn categorical_filters(&self, data: &DataPatterns, ui: &UiPatterns) -> Vec<Connection> {
        let w = &self.weights;
        let mut out = Vec::new();
        for field in &data.categorical {
            for filter in &ui.filters {
                if !self.valid_pair(field, filter) {
                    continue;
                }
                let mut score = w.categorical_base;
                match filter.kind {
                    ElementKind::Dropdown => score += w.categorical_dropdown,
                    ElementKind::Checkbox => score += w.categorical_checkbox,
                    _ => {}
                }
                if name_appears_in(&field.name, &filter.selector) {
                    score += w.categorical_name_in_selector;
                }
                let distinct = field.distinct_values().len();
                let (lo, hi) = w.categorical_distinct_range;
                if (lo..=hi).contains(&distinct) {
                    score += w.categorical_distinct_in_range;
                }
                let values = first_concrete(field.distinct_values(), w.test_value_count);
                out.extend(self.accept(
                    field,
                    filter,
                    ConnectionType::CategoricalFilter,
                    score,
                    values,
                ));
            }
        }
        out
    }

    fn searchable_search(&self, data: &DataPatterns, ui: &UiPatterns) -> Vec<Connection> {
        let w = &self.weights;
        let mut out = Vec::new();
        for field in &data.searchable {
            for search in &ui.search {
                if !self.valid_pair(field, search) {
                    continue;
                }
                let mut score = w.search_base;
                if search.kind == ElementKind::Search {
                    score += w.search_exact_type;
                }
                let in_placeholder = search
                    .placeholder
                    .as_deref()
                    .is_some_and(|p| name_appears_in(&field.name, p));
                if name_appears_in(&field.name, &search.selector) || in_placeholder {
                    score += w.search_name_match;
                }
                let (lo, hi) = w.search_length_range;
                if field.avg_length().is_some_and(|len| (lo..=hi).contains(&len)) {
                    score += w.search_length_in_range;
                }
                let values = first_concrete(field.sample_values(), w.test_value_count);
                out.extend(self.accept(
                    field,
                    search,
                    ConnectionType::SearchableSearch,
                    score,
                    values,
                ));
            }
        }
        out
    }

    fn numerical_filters(&self, data: &DataPatterns, ui: &UiPatterns) -> Vec<Connection> {
        let mut out = Vec::new();
        let range_filters: Vec<&UiElementDescriptor> = ui
            .filters
            .iter()
            .filter(|f| matches!(f.kind, ElementKind::Slider | ElementKind::Dropdown))
            .collect();
        for field in &data.numerical {
            let Some((min, max)) = field.numeric_range() else {
                continue;
            };
            for filter in &range_filters {
                if !self.valid_pair(field, filter) {
                    continue;
                }
                let values = vec![format_number(min), format_number(max)];
                out.extend(self.accept(
                    field,
                    filter,
                    ConnectionType::NumericalFilter,
                    self.weights.numerical_fixed,
                    values,
                ));
            }
        }
        out
    }

    fn sortable_sort(&self, data: &DataPatterns, ui: &UiPatterns) -> Vec<Connection> {
        let mut out = Vec::new();
        for field in &data.sortable {
            for header in &ui.sortable {
                if !self.valid_pair(field, header) {
                    continue;
                }
                out.extend(self.accept(
                    field,
                    header,
                    ConnectionType::SortableSort,
                    self.weights.sortable_fixed,
                    vec!["asc".to_string(), "desc".to_string()],
                ));
            }
        }
        out
    }
}

/// Match with default weights.
pub fn match_connections(data: &DataPatterns, ui: &UiPatterns) -> Connections {
    ConnectionMatcher::default().match_all(data, ui)
}

/// Case-insensitive containment of a field name, also trying the name with
/// spaces written as `-` or `_`.
fn name_appears_in(field: &str, haystack: &str) -> bool {
    let field = field.trim().to_lowercase();
    if field.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    [
        field.clone(),
        field.replace(char::is_whitespace, "-"),
        field.replace(char::is_whitespace, "_"),
    ]
    .iter()
    .any(|variant| haystack.contains(variant.as_str()))
}

fn first_concrete(values: &[String], count: usize) -> Vec<String> {
    values
        .iter()
        .filter(|v| is_concrete_value(v))
        .take(count)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorical(name: &str, values: &[&str], samples: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            category: FieldCategory::Categorical,
            sample_count: samples,
            stats: FieldStats::Categorical {
                distinct_values: values.iter().map(|v| v.to_string()).collect(),
                unique_count: values.len(),
            },
            relationships: vec![],
            business_rules: vec![],
        }
    }

    fn searchable(name: &str, values: &[&str], avg_length: f64) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            category: FieldCategory::Searchable,
            sample_count: 10,
            stats: FieldStats::Searchable {
                avg_length,
                sample_values: values.iter().map(|v| v.to_string()).collect(),
            },
            relationships: vec![],
            business_rules: vec![],
        }
    }

    fn numerical(name: &str, min: f64, max: f64) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            category: FieldCategory::Numerical,
            sample_count: 5,
            stats: FieldStats::Numerical {
                min,
                max,
                mean: (min + max) / 2.0,
            },
            relationships: vec![],
            business_rules: vec![],
        }
    }

    fn sortable(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            category: FieldCategory::Sortable,
            sample_count: 5,
            stats: FieldStats::Sortable {
                data_type: PrimitiveType::String,
            },
            relationships: vec![],
            business_rules: vec![],
        }
    }

    fn element(selector: &str, role: UiRole, kind: ElementKind) -> UiElementDescriptor {
        UiElementDescriptor::new(selector, role, kind, DetectionSource::NativeMarkup)
    }

    fn breed_data() -> DataPatterns {
        let mut data = DataPatterns::default();
        data.push(categorical("breed", &["Labrador", "Poodle", "Boxer"], 6));
        data
    }

    // ── categorical ──

    #[test]
    fn test_breed_dropdown_scores_full_confidence() {
        let mut ui = UiPatterns::default();
        ui.push(element("#breed-filter", UiRole::Filter, ElementKind::Dropdown));

        let connections = match_connections(&breed_data(), &ui);
        assert_eq!(connections.categorical_filter.len(), 1);
        let c = &connections.categorical_filter[0];
        assert_eq!(c.confidence, 1.0);
        assert_eq!(c.data_field, "breed");
        assert_eq!(c.ui_element, "#breed-filter");
        assert_eq!(c.test_values, vec!["Labrador", "Poodle", "Boxer"]);
    }

    #[test]
    fn test_checkbox_without_name_match() {
        let mut ui = UiPatterns::default();
        ui.push(element("#size", UiRole::Filter, ElementKind::Checkbox));
        let connections = match_connections(&breed_data(), &ui);
        let c = &connections.categorical_filter[0];
        // base + checkbox + distinct-in-range
        assert!((c.confidence - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_too_few_samples_never_connect() {
        let mut data = DataPatterns::default();
        data.push(categorical("breed", &["Labrador", "Poodle"], 2));
        let mut ui = UiPatterns::default();
        ui.push(element("#breed-filter", UiRole::Filter, ElementKind::Dropdown));
        assert!(match_connections(&data, &ui).is_empty());
    }

    #[test]
    fn test_lower_sample_bar_is_floored() {
        let mut data = DataPatterns::default();
        data.push(sortable("name"));
        data.sortable[0].sample_count = 2;
        let mut ui = UiPatterns::default();
        ui.push(element("#h", UiRole::Sortable, ElementKind::Header));

        let matcher = ConnectionMatcher::default().with_min_samples(1);
        assert!(matcher.match_all(&data, &ui).is_empty());

        data.sortable[0].sample_count = 3;
        assert_eq!(matcher.match_all(&data, &ui).sortable_sort.len(), 1);
    }

    #[test]
    fn test_invalid_selectors_never_connect() {
        let mut ui = UiPatterns::default();
        ui.push(element("", UiRole::Filter, ElementKind::Dropdown));
        ui.push(element("undefined", UiRole::Filter, ElementKind::Dropdown));
        assert!(match_connections(&breed_data(), &ui).is_empty());
    }

    #[test]
    fn test_empty_ui_yields_no_connections() {
        let connections = match_connections(&breed_data(), &UiPatterns::default());
        assert!(connections.categorical_filter.is_empty());
        assert!(connections.searchable_search.is_empty());
        assert!(connections.numerical_filter.is_empty());
        assert!(connections.sortable_sort.is_empty());
    }

    // ── search / numerical / sort ──

    #[test]
    fn test_search_scoring() {
        let mut data = DataPatterns::default();
        data.push(searchable("nickname", &["Rex", "Fido", "Ace", "Bo"], 4.0));
        let mut ui = UiPatterns::default();
        ui.push(
            element("#q", UiRole::Search, ElementKind::Search)
                .with_placeholder(Some("Search by nickname".to_string())),
        );
        ui.push(element("#other", UiRole::Search, ElementKind::Text));

        let connections = match_connections(&data, &ui);
        assert_eq!(connections.searchable_search.len(), 2);
        assert_eq!(connections.searchable_search[0].confidence, 1.0);
        assert!((connections.searchable_search[1].confidence - 0.6).abs() < 1e-5);
        assert_eq!(
            connections.searchable_search[0].test_values,
            vec!["Rex", "Fido", "Ace"]
        );
    }

    #[test]
    fn test_numerical_pairs_only_with_sliders_and_dropdowns() {
        let mut data = DataPatterns::default();
        data.push(numerical("age", 1.0, 14.5));
        let mut ui = UiPatterns::default();
        ui.push(element("#age", UiRole::Filter, ElementKind::Slider));
        ui.push(element("#vax", UiRole::Filter, ElementKind::Checkbox));

        let connections = match_connections(&data, &ui);
        assert_eq!(connections.numerical_filter.len(), 1);
        let c = &connections.numerical_filter[0];
        assert!((c.confidence - 0.7).abs() < 1e-5);
        assert_eq!(c.test_values, vec!["1", "14.5"]);
    }

    #[test]
    fn test_sortable_headers() {
        let mut data = DataPatterns::default();
        data.push(sortable("name"));
        let mut ui = UiPatterns::default();
        ui.push(element("th.sortable", UiRole::Sortable, ElementKind::Header));
        let connections = match_connections(&data, &ui);
        assert_eq!(connections.sortable_sort.len(), 1);
        assert_eq!(connections.sortable_sort[0].test_values, vec!["asc", "desc"]);
        assert!((connections.sortable_sort[0].confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_min_confidence_is_exclusive() {
        let weights = MatchWeights {
            min_confidence: 0.8,
            ..MatchWeights::default()
        };
        let mut data = DataPatterns::default();
        data.push(sortable("name"));
        let mut ui = UiPatterns::default();
        ui.push(element("th.sortable", UiRole::Sortable, ElementKind::Header));
        assert!(ConnectionMatcher::new(weights).match_all(&data, &ui).is_empty());
    }

    #[test]
    fn test_confidence_always_in_unit_range() {
        let weights = MatchWeights {
            categorical_base: 0.9,
            ..MatchWeights::default()
        };
        let mut ui = UiPatterns::default();
        ui.push(element("#breed-filter", UiRole::Filter, ElementKind::Dropdown));
        let connections = ConnectionMatcher::new(weights).match_all(&breed_data(), &ui);
        assert!(connections.iter().all(|c| (0.0..=1.0).contains(&c.confidence)));
    }

    #[test]
    fn test_name_variants() {
        assert!(name_appears_in("Breed", "#breed-filter"));
        assert!(name_appears_in("coat color", "select[name=\"coat_color\"]"));
        assert!(!name_appears_in("age", "#breed-filter"));
    }
}
