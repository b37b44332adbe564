//! Test synthesis: turns accepted connections (or, in degraded mode, UI
//! descriptors alone) into concrete test cases.
//!
//! A case only ever carries selectors and values it was handed. Nothing is
//! filled in from defaults: a connection without concrete values, or a UI
//! element without a label, produces no case.

use crate::config::SynthesisOptions;
use crate::types::*;
use std::collections::BTreeSet;

/// Option texts used per degraded-mode filter case.
const DEGRADED_OPTION_COUNT: usize = 3;

/// Builds test cases from connections or UI descriptors.
#[derive(Debug, Clone, Default)]
pub struct TestSynthesizer {
    options: SynthesisOptions,
}

impl TestSynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    /// One case per selected connection, optionally reordered by a ranking
    /// of selectors.
    pub fn synthesize(
        &self,
        connections: &Connections,
        ranking: Option<&[String]>,
    ) -> Vec<TestCase> {
        let mut cases = Vec::new();
        for connection_type in [
            ConnectionType::CategoricalFilter,
            ConnectionType::SearchableSearch,
            ConnectionType::NumericalFilter,
            ConnectionType::SortableSort,
        ] {
            for connection in self.select(connections.of_type(connection_type)) {
                match case_for_connection(connection) {
                    Some(case) => cases.push(case),
                    None => tracing::debug!(
                        "synthesizer: skipping {} × {} ({})",
                        connection.data_field,
                        connection.ui_element,
                        connection.connection_type.as_str()
                    ),
                }
            }
        }
        if let Some(ranking) = ranking {
            rank_cases(&mut cases, ranking);
        }
        tracing::info!(
            "synthesizer: {} test cases from {} connections",
            cases.len(),
            connections.len()
        );
        cases
    }

    /// Degraded mode: cases from UI descriptors alone, each needing a usable
    /// selector and a human-readable label.
    pub fn synthesize_from_ui(&self, ui: &UiPatterns, ranking: Option<&[String]>) -> Vec<TestCase> {
        let mut cases = Vec::new();
        for descriptor in ui.iter() {
            if !descriptor.has_valid_selector() {
                tracing::debug!(
                    "synthesizer: skipping {:?} element, unusable selector {:?}",
                    descriptor.role,
                    descriptor.selector
                );
                continue;
            }
            let Some(label) = descriptor.label.as_deref().filter(|l| is_concrete_value(l)) else {
                tracing::debug!(
                    "synthesizer: skipping {:?} element {}, no label",
                    descriptor.role,
                    descriptor.selector
                );
                continue;
            };
            cases.push(case_for_element(descriptor, label));
        }
        if let Some(max) = self.options.max_per_type {
            cases = cap_per_category(cases, max);
        }
        if let Some(ranking) = ranking {
            rank_cases(&mut cases, ranking);
        }
        tracing::info!("synthesizer: {} degraded-mode test cases", cases.len());
        cases
    }

    /// Apply de-duplication and the per-type cap to one connection list.
    fn select<'a>(&self, connections: &'a [Connection]) -> Vec<&'a Connection> {
        let mut selected: Vec<&Connection> = connections.iter().collect();

        if self.options.dedupe_by_field {
            let mut best: Vec<&Connection> = Vec::new();
            for connection in selected {
                match best
                    .iter_mut()
                    .find(|b| b.data_field == connection.data_field)
                {
                    Some(slot) if connection.confidence > slot.confidence => *slot = connection,
                    Some(_) => {}
                    None => best.push(connection),
                }
            }
            selected = best;
        }

        if let Some(max) = self.options.max_per_type {
            selected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            selected.truncate(max);
        }
        selected
    }
}

/// Synthesize with default options and no ranking.
pub fn synthesize(connections: &Connections) -> Vec<TestCase> {
    TestSynthesizer::default().synthesize(connections, None)
}

/// Degraded-mode synthesis with default options and no ranking.
pub fn synthesize_from_ui(ui: &UiPatterns) -> Vec<TestCase> {
    TestSynthesizer::default().synthesize_from_ui(ui, None)
}

/// Stable reorder: cases touching a ranked selector come first, in ranked
/// order; the rest keep their relative order.
pub fn rank_cases(cases: &mut [TestCase], ranking: &[String]) {
    let position = |case: &TestCase| {
        ranking
            .iter()
            .position(|selector| case.selectors.contains(selector))
            .unwrap_or(usize::MAX)
    };
    cases.sort_by_key(position);
}

fn cap_per_category(cases: Vec<TestCase>, max: usize) -> Vec<TestCase> {
    let mut kept: Vec<TestCase> = Vec::new();
    for case in cases {
        let taken = kept.iter().filter(|k| k.category == case.category).count();
        if taken < max {
            kept.push(case);
        }
    }
    kept
}

// ── Connection cases ────────────────────────────────────────────────────────

fn case_for_connection(connection: &Connection) -> Option<TestCase> {
    if !crate::ui::selector::is_valid_selector(&connection.ui_element) {
        return None;
    }
    let values: Vec<String> = connection
        .test_values
        .iter()
        .filter(|v| is_concrete_value(v))
        .cloned()
        .collect();
    if values.is_empty() {
        return None;
    }

    let field = connection.data_field.as_str();
    let selector = connection.ui_element.as_str();
    let mut steps = vec![format!("Locate {selector}")];
    let mut expected = Vec::new();

    let (name, description, category) = match connection.connection_type {
        ConnectionType::CategoricalFilter => {
            let verb = match connection.ui_kind {
                ElementKind::Checkbox => "Check",
                ElementKind::Radio => "Choose",
                ElementKind::Text | ElementKind::Search => "Type",
                _ => "Select",
            };
            for value in &values {
                steps.push(format!("{verb} \"{value}\" in {selector}"));
                steps.push(format!("Verify every visible row has {field} = \"{value}\""));
                expected.push(format!("Only rows with {field} \"{value}\" are displayed"));
            }
            (
                format!("Filter by {field}"),
                format!(
                    "Filter the data by {field} through the {} at {selector}",
                    connection.ui_kind.as_str()
                ),
                TestCategory::Filtering,
            )
        }
        ConnectionType::SearchableSearch => {
            for value in &values {
                steps.push(format!("Clear {selector}"));
                steps.push(format!("Type \"{value}\" into {selector} and submit"));
                expected.push(format!("Results include a row whose {field} contains \"{value}\""));
            }
            (
                format!("Search by {field}"),
                format!("Search for known {field} values through {selector}"),
                TestCategory::Search,
            )
        }
        ConnectionType::NumericalFilter => {
            for value in &values {
                steps.push(format!("Set {selector} to {value}"));
            }
            let range = values.join(" to ");
            expected.push(format!("Only rows with {field} within {range} are displayed"));
            (
                format!("Filter {field} by range"),
                format!("Narrow {field} through the {} at {selector}", connection.ui_kind.as_str()),
                TestCategory::Filtering,
            )
        }
        ConnectionType::SortableSort => {
            for direction in &values {
                steps.push(format!("Click {selector} until sorted {direction}"));
                expected.push(format!("Rows are ordered by {field} {direction}"));
            }
            (
                format!("Sort by {field}"),
                format!("Sort the data by {field} using {selector}"),
                TestCategory::Sorting,
            )
        }
    };

    Some(TestCase {
        name,
        description,
        category,
        priority: Priority::from_confidence(connection.confidence),
        steps,
        selectors: BTreeSet::from([selector.to_string()]),
        data_field: Some(field.to_string()),
        test_values: values,
        expected_results: expected,
    })
}

// ── Degraded-mode cases ─────────────────────────────────────────────────────

fn case_for_element(descriptor: &UiElementDescriptor, label: &str) -> TestCase {
    let selector = descriptor.selector.as_str();
    let mut steps = vec![format!("Locate {selector}")];
    let mut expected = Vec::new();
    let mut values: Vec<String> = Vec::new();
    let mut priority = Priority::Low;

    let (name, category) = match descriptor.role {
        UiRole::Filter => {
            values = descriptor
                .options
                .iter()
                .filter(|o| is_concrete_value(o))
                .take(DEGRADED_OPTION_COUNT)
                .cloned()
                .collect();
            if values.is_empty() {
                steps.push(format!("Change the value of {selector}"));
                expected.push(format!("The view updates after changing {label}"));
            }
            for option in &values {
                steps.push(format!("Select \"{option}\" in {selector}"));
                expected.push(format!("The view updates to reflect \"{option}\""));
            }
            (format!("Use the {label} filter"), TestCategory::Filtering)
        }
        UiRole::Search => {
            steps.push(format!("Focus {selector}"));
            expected.push(format!("{label} accepts text input"));
            (format!("Use the {label} search"), TestCategory::Search)
        }
        UiRole::Table => {
            priority = Priority::Medium;
            values = descriptor.headers.clone();
            if !values.is_empty() {
                steps.push(format!("Read the column headers of {selector}"));
                expected.push(format!("Columns are shown: {}", values.join(", ")));
            }
            if let Some(rows) = descriptor.row_count {
                steps.push(format!("Count the rows of {selector}"));
                expected.push(format!("{rows} rows are available"));
            }
            expected.push(format!("{label} is visible"));
            (format!("Display {label}"), TestCategory::DataDisplay)
        }
        UiRole::Sortable => {
            steps.push(format!("Click {selector}"));
            steps.push(format!("Click {selector} again"));
            expected.push(format!("Rows reorder by {label} in both directions"));
            (format!("Sort by {label}"), TestCategory::Sorting)
        }
        UiRole::Pagination => {
            steps.push(format!("Move to the next page with {selector}"));
            steps.push(format!("Move back to the previous page with {selector}"));
            expected.push(
                "A different page of rows is shown and the first page returns".to_string(),
            );
            (format!("Paginate with {label}"), TestCategory::Navigation)
        }
        UiRole::Button => {
            steps.push(format!("Click {selector}"));
            expected.push(format!("{label} responds without errors"));
            (format!("Click {label}"), TestCategory::Interaction)
        }
        UiRole::Form => {
            values = descriptor.fields.clone();
            if !values.is_empty() {
                steps.push(format!("Inspect the fields of {selector}"));
                expected.push(format!("Fields are present: {}", values.join(", ")));
            }
            expected.push(format!("{label} form can be submitted"));
            (format!("Submit {label}"), TestCategory::Forms)
        }
    };

    TestCase {
        name,
        description: format!(
            "{} {} detected without tabular data",
            descriptor.kind.as_str(),
            selector
        ),
        category,
        priority,
        steps,
        selectors: BTreeSet::from([selector.to_string()]),
        data_field: None,
        test_values: values,
        expected_results: expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectionType::{
        CategoricalFilter, NumericalFilter, SearchableSearch, SortableSort,
    };

    fn connection(
        field: &str,
        selector: &str,
        connection_type: ConnectionType,
        confidence: f32,
        values: &[&str],
    ) -> Connection {
        Connection {
            data_field: field.to_string(),
            ui_element: selector.to_string(),
            ui_kind: ElementKind::Dropdown,
            connection_type,
            confidence,
            test_values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn sample_connections() -> Connections {
        let breeds = &["Labrador", "Poodle", "Boxer"];
        Connections {
            categorical_filter: vec![
                connection("breed", "#breed-filter", CategoricalFilter, 1.0, breeds),
                connection("breed", "#size", CategoricalFilter, 0.7, breeds),
                connection("color", "#color", CategoricalFilter, 0.9, &["Black", "Brown"]),
            ],
            searchable_search: vec![connection(
                "name",
                "#q",
                SearchableSearch,
                0.6,
                &["Rex", "Fido"],
            )],
            numerical_filter: vec![connection("age", "#age", NumericalFilter, 0.7, &["1", "14"])],
            sortable_sort: vec![connection(
                "name",
                "th.sortable",
                SortableSort,
                0.8,
                &["asc", "desc"],
            )],
        }
    }

    // ── connection mode ──

    #[test]
    fn test_one_case_per_connection() {
        let connections = sample_connections();
        let cases = synthesize(&connections);
        assert_eq!(cases.len(), connections.len());
        assert_eq!(cases[0].name, "Filter by breed");
        assert_eq!(cases[0].priority, Priority::High);
        assert_eq!(cases[0].category, TestCategory::Filtering);
        assert_eq!(cases[3].category, TestCategory::Search);
        assert_eq!(cases[3].priority, Priority::Medium);
        assert_eq!(cases[5].category, TestCategory::Sorting);
    }

    #[test]
    fn test_cases_only_use_given_selectors_and_values() {
        let connections = sample_connections();
        let selectors: BTreeSet<String> =
            connections.iter().map(|c| c.ui_element.clone()).collect();
        for case in synthesize(&connections) {
            assert!(case.selectors.is_subset(&selectors));
            let origin = connections
                .iter()
                .find(|c| {
                    case.selectors.contains(&c.ui_element)
                        && case.data_field.as_deref() == Some(c.data_field.as_str())
                })
                .unwrap();
            assert!(case.test_values.iter().all(|v| origin.test_values.contains(v)));
        }
    }

    #[test]
    fn test_placeholder_values_are_dropped() {
        let connections = Connections {
            categorical_filter: vec![
                connection("breed", "#breed", CategoricalFilter, 0.9, &["undefined", "Pug"]),
                connection("coat", "#coat", CategoricalFilter, 0.9, &["null", ""]),
            ],
            ..Default::default()
        };
        let cases = synthesize(&connections);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].test_values, vec!["Pug"]);
    }

    #[test]
    fn test_invalid_selector_yields_no_case() {
        let connections = Connections {
            sortable_sort: vec![connection(
                "name",
                "undefined",
                SortableSort,
                0.8,
                &["asc", "desc"],
            )],
            ..Default::default()
        };
        assert!(synthesize(&connections).is_empty());
    }

    #[test]
    fn test_dedupe_keeps_best_per_field() {
        let synthesizer = TestSynthesizer::new(SynthesisOptions {
            dedupe_by_field: true,
            max_per_type: None,
        });
        let cases = synthesizer.synthesize(&sample_connections(), None);
        let filters: Vec<_> = cases
            .iter()
            .filter(|c| c.category == TestCategory::Filtering && c.name.starts_with("Filter by"))
            .collect();
        assert_eq!(filters.len(), 2);
        assert!(filters[0].selectors.contains("#breed-filter"));
    }

    #[test]
    fn test_max_per_type_keeps_highest_confidence() {
        let synthesizer = TestSynthesizer::new(SynthesisOptions {
            dedupe_by_field: false,
            max_per_type: Some(1),
        });
        let cases = synthesizer.synthesize(&sample_connections(), None);
        assert_eq!(cases.len(), 4);
        assert!(cases[0].selectors.contains("#breed-filter"));
    }

    #[test]
    fn test_ranking_reorders_stably() {
        let ranking = vec!["#age".to_string(), "#q".to_string()];
        let cases = TestSynthesizer::default().synthesize(&sample_connections(), Some(&ranking));
        assert!(cases[0].selectors.contains("#age"));
        assert!(cases[1].selectors.contains("#q"));
        assert!(cases[2].selectors.contains("#breed-filter"));
        assert!(cases[3].selectors.contains("#size"));
    }

    // ── degraded mode ──

    fn native(selector: &str, role: UiRole, kind: ElementKind) -> UiElementDescriptor {
        UiElementDescriptor::new(selector, role, kind, DetectionSource::NativeMarkup)
    }

    fn ui() -> UiPatterns {
        let mut ui = UiPatterns::default();
        ui.push(
            native("#breed", UiRole::Filter, ElementKind::Dropdown)
                .with_label(Some("Breed".to_string()))
                .with_options(vec!["Lab".into(), "Pug".into(), "Boxer".into(), "Corgi".into()]),
        );
        ui.push(
            native("#dogs", UiRole::Table, ElementKind::Table)
                .with_label(Some("Dogs".to_string()))
                .with_headers(vec!["Name".into(), "Breed".into()])
                .with_row_count(Some(12)),
        );
        ui.push(native("#go", UiRole::Button, ElementKind::Button));
        ui.push(
            native("undefined", UiRole::Button, ElementKind::Button)
                .with_label(Some("Ghost".to_string())),
        );
        ui
    }

    #[test]
    fn test_degraded_mode_requires_selector_and_label() {
        let cases = synthesize_from_ui(&ui());
        assert_eq!(cases.len(), 2);
        assert!(cases.iter().all(|c| c.data_field.is_none()));
    }

    #[test]
    fn test_degraded_values_come_from_dom() {
        let ui = ui();
        let cases = synthesize_from_ui(&ui);
        assert_eq!(cases[0].test_values, vec!["Lab", "Pug", "Boxer"]);
        assert_eq!(cases[0].priority, Priority::Low);
        assert_eq!(cases[1].test_values, vec!["Name", "Breed"]);
        assert_eq!(cases[1].priority, Priority::Medium);
        assert!(cases[1].expected_results.iter().any(|e| e.contains("12 rows")));
        let dom_selectors = ui.selectors();
        assert!(cases.iter().all(|c| c.selectors.is_subset(&dom_selectors)));
    }

    #[test]
    fn test_degraded_cap_per_category() {
        let mut ui = ui();
        ui.push(
            native("#size", UiRole::Filter, ElementKind::Dropdown)
                .with_label(Some("Size".to_string())),
        );
        let synthesizer = TestSynthesizer::new(SynthesisOptions {
            dedupe_by_field: false,
            max_per_type: Some(1),
        });
        let cases = synthesizer.synthesize_from_ui(&ui, None);
        assert_eq!(
            cases.iter().filter(|c| c.category == TestCategory::Filtering).count(),
            1
        );
    }
}
