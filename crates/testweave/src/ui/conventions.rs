//! Widget-library naming conventions and role vocabulary, embedded at
//! compile time from `ui_conventions.json`.

use crate::types::{ElementKind, UiRole};
use scraper::ElementRef;
use serde::Deserialize;
use std::sync::OnceLock;

/// Raw JSON content of the convention table, embedded so there is no runtime file I/O.
const CONVENTIONS_JSON: &str = include_str!("ui_conventions.json");

/// Parsed convention table.
#[derive(Debug, Default, Deserialize)]
pub struct UiConventions {
    #[serde(default)]
    pub components: Vec<ComponentConvention>,
    #[serde(default)]
    pub column_headers: MarkerSet,
    #[serde(default)]
    pub rows: MarkerSet,
    #[serde(default)]
    pub sort_markers: Vec<String>,
    #[serde(default)]
    pub heuristics: HeuristicVocabulary,
}

/// One widget family: the role it plays and how to recognise it.
#[derive(Debug, Deserialize)]
pub struct ComponentConvention {
    pub role: UiRole,
    pub kind: ElementKind,
    #[serde(default)]
    pub class_prefixes: Vec<String>,
    #[serde(default)]
    pub aria_roles: Vec<String>,
}

impl ComponentConvention {
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        has_aria_role(el, &self.aria_roles)
            || el.value().classes().any(|class| {
                let class = class.to_ascii_lowercase();
                self.class_prefixes
                    .iter()
                    .any(|p| class.starts_with(&p.to_ascii_lowercase()))
            })
    }
}

/// Class substrings or ARIA roles that mark a structural part (header cell, row).
#[derive(Debug, Default, Deserialize)]
pub struct MarkerSet {
    #[serde(default)]
    pub class_markers: Vec<String>,
    #[serde(default)]
    pub aria_roles: Vec<String>,
}

impl MarkerSet {
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        has_aria_role(el, &self.aria_roles)
            || el.value().classes().any(|class| {
                let class = class.to_ascii_lowercase();
                self.class_markers
                    .iter()
                    .any(|m| class.contains(&m.to_ascii_lowercase()))
            })
    }
}

/// Phrases the heuristic-text layer looks for.
#[derive(Debug, Default, Deserialize)]
pub struct HeuristicVocabulary {
    #[serde(default)]
    pub filter_phrases: Vec<String>,
    #[serde(default)]
    pub search_phrases: Vec<String>,
    #[serde(default)]
    pub pagination_phrases: Vec<String>,
    #[serde(default)]
    pub column_vocabulary: Vec<String>,
}

impl UiConventions {
    /// Whether any class on the element carries a sort marker.
    pub fn has_sort_class(&self, el: &ElementRef<'_>) -> bool {
        el.value().classes().any(|class| {
            let class = class.to_ascii_lowercase();
            self.sort_markers.iter().any(|m| class.contains(m.as_str()))
        })
    }
}

/// Parse and cache the embedded convention table.
pub fn conventions() -> &'static UiConventions {
    static CONVENTIONS: OnceLock<UiConventions> = OnceLock::new();
    CONVENTIONS.get_or_init(|| {
        serde_json::from_str(CONVENTIONS_JSON).unwrap_or_else(|e| {
            tracing::warn!("ui conventions failed to parse, component layer disabled: {e}");
            UiConventions::default()
        })
    })
}

fn has_aria_role(el: &ElementRef<'_>, roles: &[String]) -> bool {
    el.value()
        .attr("role")
        .map(|role| {
            role.split_whitespace()
                .any(|r| roles.iter().any(|known| known.eq_ignore_ascii_case(r)))
        })
        .unwrap_or(false)
}
