//! Core data types shared by every pipeline stage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One parsed row of tabular data, keyed by column name.
pub type Record = BTreeMap<String, String>;

/// Literal values that exports use for "no value".
const PLACEHOLDER_VALUES: &[&str] = &["null", "undefined", "none", "nan", "n/a"];

/// Whether a raw cell carries a concrete value (non-blank, not a placeholder literal).
pub fn is_concrete_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && !PLACEHOLDER_VALUES
            .iter()
            .any(|p| trimmed.eq_ignore_ascii_case(p))
}

// ── Field descriptors ───────────────────────────────────────────────────────

/// Semantic category a field can be tagged with. Tags are not exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Categorical,
    Numerical,
    Identifier,
    Searchable,
    Temporal,
    Sortable,
}

/// Primitive type inferred for sorting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Number,
    Date,
    String,
}

/// Date/time layout recognised in temporal fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "YYYY-MM-DD")]
    IsoDate,
    #[serde(rename = "MM/DD/YYYY")]
    UsDate,
    #[serde(rename = "ISO8601")]
    IsoDateTime,
}

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsoDate => "YYYY-MM-DD",
            Self::UsDate => "MM/DD/YYYY",
            Self::IsoDateTime => "ISO8601",
        }
    }
}

/// Category-specific statistics attached to a [`FieldDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldStats {
    Categorical {
        /// Distinct values in first-seen order.
        distinct_values: Vec<String>,
        unique_count: usize,
    },
    Numerical {
        min: f64,
        max: f64,
        mean: f64,
    },
    Identifier {
        /// Distinct / total non-empty samples.
        uniqueness: f64,
    },
    Searchable {
        avg_length: f64,
        /// Up to five representative values.
        sample_values: Vec<String>,
    },
    Temporal {
        format: DateFormat,
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
    },
    Sortable {
        data_type: PrimitiveType,
    },
}

/// Classified semantic profile of one tabular column under one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub category: FieldCategory,
    /// Number of non-empty samples the classification saw.
    pub sample_count: usize,
    pub stats: FieldStats,
    pub relationships: Vec<String>,
    pub business_rules: Vec<String>,
}

impl FieldDescriptor {
    /// Distinct values for categorical descriptors, empty otherwise.
    pub fn distinct_values(&self) -> &[String] {
        match &self.stats {
            FieldStats::Categorical {
                distinct_values, ..
            } => distinct_values,
            _ => &[],
        }
    }

    /// Representative values for searchable descriptors, empty otherwise.
    pub fn sample_values(&self) -> &[String] {
        match &self.stats {
            FieldStats::Searchable { sample_values, .. } => sample_values,
            _ => &[],
        }
    }

    /// `(min, max)` for numerical descriptors.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        match self.stats {
            FieldStats::Numerical { min, max, .. } => Some((min, max)),
            _ => None,
        }
    }

    /// Mean sample length for searchable descriptors.
    pub fn avg_length(&self) -> Option<f64> {
        match self.stats {
            FieldStats::Searchable { avg_length, .. } => Some(avg_length),
            _ => None,
        }
    }
}

/// Output of the data classifier: one tagged collection per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPatterns {
    pub categorical: Vec<FieldDescriptor>,
    pub numerical: Vec<FieldDescriptor>,
    pub identifier: Vec<FieldDescriptor>,
    pub searchable: Vec<FieldDescriptor>,
    pub temporal: Vec<FieldDescriptor>,
    pub sortable: Vec<FieldDescriptor>,
}

impl DataPatterns {
    /// Route a descriptor into the collection for its category.
    pub fn push(&mut self, descriptor: FieldDescriptor) {
        match descriptor.category {
            FieldCategory::Categorical => self.categorical.push(descriptor),
            FieldCategory::Numerical => self.numerical.push(descriptor),
            FieldCategory::Identifier => self.identifier.push(descriptor),
            FieldCategory::Searchable => self.searchable.push(descriptor),
            FieldCategory::Temporal => self.temporal.push(descriptor),
            FieldCategory::Sortable => self.sortable.push(descriptor),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.categorical
            .iter()
            .chain(&self.numerical)
            .chain(&self.identifier)
            .chain(&self.searchable)
            .chain(&self.temporal)
            .chain(&self.sortable)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Compact per-field view handed to an auxiliary ranker.
    pub fn summary(&self) -> FieldSummary {
        let mut fields: Vec<FieldSummaryEntry> = Vec::new();
        for descriptor in self.iter() {
            match fields.iter_mut().find(|f| f.name == descriptor.name) {
                Some(entry) => {
                    entry.categories.insert(descriptor.category);
                }
                None => fields.push(FieldSummaryEntry {
                    name: descriptor.name.clone(),
                    categories: BTreeSet::from([descriptor.category]),
                    sample_count: descriptor.sample_count,
                }),
            }
        }
        FieldSummary { fields }
    }
}

/// Field names with their category tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub fields: Vec<FieldSummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummaryEntry {
    pub name: String,
    pub categories: BTreeSet<FieldCategory>,
    pub sample_count: usize,
}

// ── UI element descriptors ──────────────────────────────────────────────────

/// What a UI element is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRole {
    Filter,
    Search,
    Table,
    Sortable,
    Pagination,
    Button,
    Form,
}

/// Concrete control shape behind a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Dropdown,
    Checkbox,
    Radio,
    Slider,
    Search,
    Text,
    Table,
    Grid,
    Header,
    Pagination,
    Button,
    Form,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Slider => "slider",
            Self::Search => "search",
            Self::Text => "text",
            Self::Table => "table",
            Self::Grid => "grid",
            Self::Header => "header",
            Self::Pagination => "pagination",
            Self::Button => "button",
            Self::Form => "form",
        }
    }
}

/// Which detection layer produced a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    NativeMarkup,
    ComponentFramework,
    HeuristicText,
}

/// Classified semantic profile of one element in a rendered interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElementDescriptor {
    /// CSS selector locating the element (or control group).
    pub selector: String,
    pub role: UiRole,
    pub kind: ElementKind,
    /// Human-readable label, when one could be found.
    pub label: Option<String>,
    pub placeholder: Option<String>,
    /// Option texts for dropdowns and toggle groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Column names for tables and grids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    pub row_count: Option<usize>,
    /// Field names inside forms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    pub source: DetectionSource,
}

impl UiElementDescriptor {
    pub fn new(
        selector: impl Into<String>,
        role: UiRole,
        kind: ElementKind,
        source: DetectionSource,
    ) -> Self {
        Self {
            selector: selector.into(),
            role,
            kind,
            label: None,
            placeholder: None,
            options: Vec::new(),
            headers: Vec::new(),
            row_count: None,
            fields: Vec::new(),
            source,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|l| is_concrete_value(l));
        self
    }

    pub fn with_placeholder(mut self, placeholder: Option<String>) -> Self {
        self.placeholder = placeholder.filter(|p| is_concrete_value(p));
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Whether the selector is non-empty, not a literal `undefined`, and parses.
    pub fn has_valid_selector(&self) -> bool {
        crate::ui::selector::is_valid_selector(&self.selector)
    }
}

/// Output of the UI classifier: one list per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiPatterns {
    pub filters: Vec<UiElementDescriptor>,
    pub search: Vec<UiElementDescriptor>,
    pub tables: Vec<UiElementDescriptor>,
    pub sortable: Vec<UiElementDescriptor>,
    pub pagination: Vec<UiElementDescriptor>,
    pub buttons: Vec<UiElementDescriptor>,
    pub forms: Vec<UiElementDescriptor>,
}

impl UiPatterns {
    /// Route a descriptor into the list for its role.
    pub fn push(&mut self, descriptor: UiElementDescriptor) {
        match descriptor.role {
            UiRole::Filter => self.filters.push(descriptor),
            UiRole::Search => self.search.push(descriptor),
            UiRole::Table => self.tables.push(descriptor),
            UiRole::Sortable => self.sortable.push(descriptor),
            UiRole::Pagination => self.pagination.push(descriptor),
            UiRole::Button => self.buttons.push(descriptor),
            UiRole::Form => self.forms.push(descriptor),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &UiElementDescriptor> {
        self.filters
            .iter()
            .chain(&self.search)
            .chain(&self.tables)
            .chain(&self.sortable)
            .chain(&self.pagination)
            .chain(&self.buttons)
            .chain(&self.forms)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Every selector carried by any descriptor.
    pub fn selectors(&self) -> BTreeSet<String> {
        self.iter().map(|d| d.selector.clone()).collect()
    }
}

// ── Connections ─────────────────────────────────────────────────────────────

/// Rule under which a field was paired with a UI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    CategoricalFilter,
    SearchableSearch,
    NumericalFilter,
    SortableSort,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoricalFilter => "categorical_filter",
            Self::SearchableSearch => "searchable_search",
            Self::NumericalFilter => "numerical_filter",
            Self::SortableSort => "sortable_sort",
        }
    }
}

/// A scored, type-tagged pairing of a data field with a UI element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub data_field: String,
    /// Selector of the paired UI element.
    pub ui_element: String,
    pub ui_kind: ElementKind,
    pub connection_type: ConnectionType,
    /// Heuristic likelihood in `[0.0, 1.0]`.
    pub confidence: f32,
    pub test_values: Vec<String>,
}

/// Output of the matcher: one list per connection type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    pub categorical_filter: Vec<Connection>,
    pub searchable_search: Vec<Connection>,
    pub numerical_filter: Vec<Connection>,
    pub sortable_sort: Vec<Connection>,
}

impl Connections {
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.categorical_filter
            .iter()
            .chain(&self.searchable_search)
            .chain(&self.numerical_filter)
            .chain(&self.sortable_sort)
    }

    pub fn of_type(&self, connection_type: ConnectionType) -> &[Connection] {
        match connection_type {
            ConnectionType::CategoricalFilter => &self.categorical_filter,
            ConnectionType::SearchableSearch => &self.searchable_search,
            ConnectionType::NumericalFilter => &self.numerical_filter,
            ConnectionType::SortableSort => &self.sortable_sort,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

// ── Test cases ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Filtering,
    Search,
    Sorting,
    Navigation,
    Interaction,
    DataDisplay,
    Forms,
}

/// A concrete, executable test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub category: TestCategory,
    pub priority: Priority,
    pub steps: Vec<String>,
    pub selectors: BTreeSet<String>,
    /// Originating data field; absent for UI-only cases.
    pub data_field: Option<String>,
    pub test_values: Vec<String>,
    pub expected_results: Vec<String>,
}
