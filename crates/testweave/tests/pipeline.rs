//! End-to-end tests for the synchronous pipeline:
//! classify_data → classify_ui → match_connections → synthesize.

use std::collections::BTreeSet;

use serde_json::json;
use testweave::*;

// ─────────────────────── helpers ───────────────────────

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Six dogs, three breeds, unique names.
fn dog_records() -> Vec<Record> {
    [
        ("Rex", "Labrador"),
        ("Bella", "Poodle"),
        ("Max", "Boxer"),
        ("Luna", "Poodle"),
        ("Charlie", "Labrador"),
        ("Daisy", "Boxer"),
    ]
    .iter()
    .map(|(name, breed)| record(&[("name", name), ("breed", breed)]))
    .collect()
}

fn breed_page() -> MarkupSnapshot {
    MarkupSnapshot::Markup(
        r#"<html><body>
          <label for="breed-filter">Breed</label>
          <select id="breed-filter">
            <option value="">All</option>
            <option>Labrador</option><option>Poodle</option><option>Boxer</option>
          </select>
        </body></html>"#
            .to_string(),
    )
}

// ─────────────────────── scenarios ───────────────────────

#[test]
fn test_breed_dropdown_end_to_end() {
    let data = classify_data(&dog_records());
    let ui = classify_ui(&breed_page());
    let connections = match_connections(&data, &ui);

    assert_eq!(connections.categorical_filter.len(), 1);
    let c = &connections.categorical_filter[0];
    assert_eq!(c.data_field, "breed");
    assert_eq!(c.ui_element, "#breed-filter");
    assert_eq!(c.confidence, 1.0);
    assert_eq!(c.test_values.len(), 3);
    let known: BTreeSet<&str> = ["Labrador", "Poodle", "Boxer"].into_iter().collect();
    assert!(c.test_values.iter().all(|v| known.contains(v.as_str())));

    let cases = synthesize(&connections);
    assert_eq!(cases.len(), connections.len());
    assert_eq!(cases[0].priority, Priority::High);
    assert_eq!(cases[0].data_field.as_deref(), Some("breed"));
}

#[test]
fn test_two_sample_field_is_not_described() {
    let mut records = dog_records();
    records[0].insert("color".to_string(), "Black".to_string());
    records[1].insert("color".to_string(), "Brown".to_string());

    let data = classify_data(&records);
    let described_as = |list: &[FieldDescriptor]| list.iter().any(|d| d.name == "color");
    assert!(!described_as(&data.categorical));
    assert!(!described_as(&data.searchable));
    assert!(!described_as(&data.sortable));
}

#[test]
fn test_empty_markup_yields_no_connections() {
    let data = classify_data(&dog_records());
    assert!(!data.is_empty());
    let ui = classify_ui(&MarkupSnapshot::Markup(String::new()));
    assert!(ui.is_empty());

    let connections = match_connections(&data, &ui);
    assert!(connections.categorical_filter.is_empty());
    assert!(connections.searchable_search.is_empty());
    assert!(connections.numerical_filter.is_empty());
    assert!(connections.sortable_sort.is_empty());
}

#[test]
fn test_sort_dropdown_is_not_a_sort_target() {
    let data = classify_data(&dog_records());
    let ui = classify_ui(&MarkupSnapshot::Markup(
        r#"<p>Sort by <select name="order">
             <option>Name</option><option>Breed</option>
           </select></p>"#
            .to_string(),
    ));
    assert!(ui.sortable.is_empty());

    let connections = match_connections(&data, &ui);
    assert!(connections.sortable_sort.is_empty());
    assert!(synthesize(&connections)
        .iter()
        .all(|c| c.category != TestCategory::Sorting));
}

#[test]
fn test_classification_is_deterministic() {
    let records = dog_records();
    assert_eq!(classify_data(&records), classify_data(&records));
    assert_eq!(classify_ui(&breed_page()), classify_ui(&breed_page()));
}

#[test]
fn test_tree_snapshot_matches_markup_snapshot() {
    let tree: DomNode = serde_json::from_value(json!({
        "tag": "div",
        "children": [
            { "tag": "label", "attributes": { "for": "breed-filter" }, "text": "Breed" },
            {
                "tag": "select",
                "attributes": { "id": "breed-filter" },
                "children": [
                    { "tag": "option", "text": "Labrador" },
                    { "tag": "option", "text": "Poodle" },
                    { "tag": "option", "text": "Boxer" }
                ]
            }
        ]
    }))
    .unwrap();

    let ui = classify_ui(&MarkupSnapshot::Tree(tree));
    assert_eq!(ui.filters.len(), 1);
    assert_eq!(ui.filters[0].selector, "#breed-filter");
    assert_eq!(ui.filters[0].label.as_deref(), Some("Breed"));
    assert_eq!(ui.filters[0].options, vec!["Labrador", "Poodle", "Boxer"]);
}

// ─────────────────────── properties ───────────────────────

fn busy_page() -> MarkupSnapshot {
    MarkupSnapshot::Markup(
        r#"<main>
          <div class="filters">
            <span>Filter by breed</span>
            <select name="breed"><option>Labrador</option><option>Poodle</option></select>
            <input type="search" id="dog-search" placeholder="Search by name">
            <div class="MuiSelect-root" id="undefined"></div>
          </div>
          <h2>Dogs</h2>
          <table id="dogs">
            <thead><tr><th class="sortable">Name</th><th class="sortable">Breed</th></tr></thead>
            <tbody><tr><td>Rex</td><td>Labrador</td></tr></tbody>
          </table>
          <p>Showing 1-1 of 6</p>
          <nav class="pagination"><a>Previous</a><a>Next</a></nav>
        </main>"#
            .to_string(),
    )
}

#[test]
fn test_connections_only_reference_valid_ui_elements() {
    let ui = classify_ui(&busy_page());
    assert!(ui.iter().all(|d| d.has_valid_selector()));
    assert!(!ui.selectors().iter().any(|s| s.contains("undefined")));

    let data = classify_data(&dog_records());
    let connections = match_connections(&data, &ui);
    assert!(!connections.is_empty());
    let selectors = ui.selectors();
    for c in connections.iter() {
        assert!(selectors.contains(&c.ui_element));
        assert!((0.0..=1.0).contains(&c.confidence));
        assert!(c.confidence > 0.2);
    }
}

#[test]
fn test_table_row_count_from_caption() {
    let ui = classify_ui(&busy_page());
    let table = ui.tables.iter().find(|t| t.selector == "#dogs").unwrap();
    assert_eq!(table.row_count, Some(6));
    assert_eq!(table.headers, vec!["Name", "Breed"]);
    assert_eq!(table.label.as_deref(), Some("Dogs"));
    assert_eq!(ui.sortable.len(), 2);
}

#[test]
fn test_test_cases_stay_within_inputs() {
    let ui = classify_ui(&busy_page());
    let data = classify_data(&dog_records());
    let connections = match_connections(&data, &ui);
    let cases = synthesize(&connections);
    assert_eq!(cases.len(), connections.len());

    let input_selectors: BTreeSet<String> =
        connections.iter().map(|c| c.ui_element.clone()).collect();
    for case in &cases {
        assert!(case.selectors.is_subset(&input_selectors));
        let origin_values: BTreeSet<&String> = connections
            .iter()
            .filter(|c| case.selectors.contains(&c.ui_element))
            .filter(|c| case.data_field.as_deref() == Some(c.data_field.as_str()))
            .flat_map(|c| c.test_values.iter())
            .collect();
        assert!(case.test_values.iter().all(|v| origin_values.contains(v)));
    }
}

#[test]
fn test_degraded_mode_uses_dom_values_only() {
    let ui = classify_ui(&busy_page());
    let cases = synthesize_from_ui(&ui);
    assert!(!cases.is_empty());
    let dom_selectors = ui.selectors();
    for case in &cases {
        assert!(case.data_field.is_none());
        assert!(case.selectors.is_subset(&dom_selectors));
    }
    let table_case = cases
        .iter()
        .find(|c| c.category == TestCategory::DataDisplay)
        .unwrap();
    assert_eq!(table_case.test_values, vec!["Name", "Breed"]);
}
