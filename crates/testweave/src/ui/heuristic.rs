//! Last-resort detection from visible text: captions like "Filter by" next
//! to an unlabelled control, div-based header rows, and next/previous links.

use super::conventions::{conventions, UiConventions};
use super::counts::nearby_row_count;
use super::selector::{accessible_label, build_selector, element_text, non_blank, own_text};
use super::{css, DetectionLayer, ParsedSnapshot};
use crate::error::LayerError;
use crate::types::{is_concrete_value, DetectionSource, ElementKind, UiElementDescriptor, UiRole};
use scraper::{ElementRef, Html};

const LAYER: &str = "heuristic_text";
const SOURCE: DetectionSource = DetectionSource::HeuristicText;

/// Longest caption treated as a control label.
const MAX_PHRASE_CHARS: usize = 40;

/// Longest cell text in a header row.
const MAX_HEADER_CHARS: usize = 30;

/// Following siblings searched for the control a caption refers to.
const CONTROL_WINDOW: usize = 3;

const CAPTION_TAGS: &str = "label, span, div, p, legend, strong, b, dt, h1, h2, h3, h4, h5, h6";

const INTERACTIVE_ROLES: &[&str] = &[
    "combobox", "listbox", "searchbox", "slider", "textbox", "checkbox", "radiogroup",
];

/// Detects controls and tables from text cues alone.
pub struct HeuristicTextLayer {
    conventions: &'static UiConventions,
}

impl Default for HeuristicTextLayer {
    fn default() -> Self {
        Self {
            conventions: conventions(),
        }
    }
}

impl DetectionLayer for HeuristicTextLayer {
    fn name(&self) -> &'static str {
        LAYER
    }

    fn detect(&self, snapshot: &ParsedSnapshot) -> Result<Vec<UiElementDescriptor>, LayerError> {
        let doc = snapshot.document();
        let mut found = Vec::new();
        self.phrase_controls(doc, &mut found)?;
        self.header_rows(doc, &mut found)?;
        self.pagination_links(doc, &mut found)?;
        Ok(found)
    }
}

impl HeuristicTextLayer {
    fn phrase_controls(
        &self,
        doc: &Html,
        found: &mut Vec<UiElementDescriptor>,
    ) -> Result<(), LayerError> {
        let caption_sel = css(LAYER, CAPTION_TAGS)?;
        let option_sel = css(LAYER, "option")?;
        let vocabulary = &self.conventions.heuristics;
        let mut used: Vec<ElementRef<'_>> = Vec::new();

        for caption in doc.select(&caption_sel) {
            let text = own_text(&caption);
            let text = text.trim_end_matches(':').trim();
            if text.is_empty() || text.chars().count() > MAX_PHRASE_CHARS {
                continue;
            }
            let lower = text.to_lowercase();
            let role = if starts_with_any(&lower, &vocabulary.filter_phrases) {
                UiRole::Filter
            } else if starts_with_any(&lower, &vocabulary.search_phrases) {
                UiRole::Search
            } else {
                continue;
            };

            let Some(control) = nearest_control(&caption) else {
                continue;
            };
            if used.iter().any(|u| u.id() == control.id()) {
                continue;
            }
            used.push(control);

            let Some(selector) = build_selector(doc, &control) else {
                continue;
            };
            let kind = control_kind(&control);
            let options = if control.value().name() == "select" {
                control
                    .select(&option_sel)
                    .filter(|o| o.value().attr("value").map_or(true, |v| !v.trim().is_empty()))
                    .map(|o| element_text(&o))
                    .filter(|t| is_concrete_value(t))
                    .collect()
            } else {
                Vec::new()
            };
            found.push(
                UiElementDescriptor::new(selector, role, kind, SOURCE)
                    .with_label(Some(text.to_string()))
                    .with_placeholder(non_blank(control.value().attr("placeholder")))
                    .with_options(options),
            );
        }
        Ok(())
    }

    /// Rows of short cells drawn with divs, where most cells name a typical column.
    fn header_rows(
        &self,
        doc: &Html,
        found: &mut Vec<UiElementDescriptor>,
    ) -> Result<(), LayerError> {
        let row_sel = css(LAYER, "div, ul, section, header")?;
        let vocabulary = &self.conventions.heuristics.column_vocabulary;
        let mut containers: Vec<ElementRef<'_>> = Vec::new();

        for row in doc.select(&row_sel) {
            if inside_table(&row) {
                continue;
            }
            let cells: Vec<ElementRef<'_>> = row.children().filter_map(ElementRef::wrap).collect();
            if cells.len() < 3 {
                continue;
            }
            let texts: Vec<String> = cells.iter().map(element_text).collect();
            if texts
                .iter()
                .any(|t| t.is_empty() || t.chars().count() > MAX_HEADER_CHARS)
            {
                continue;
            }
            let known = texts
                .iter()
                .filter(|t| {
                    let t = t.trim_end_matches(':').to_lowercase();
                    vocabulary.iter().any(|v| *v == t)
                })
                .count();
            if known < 2 || known * 2 < texts.len() {
                continue;
            }

            let container = row
                .parent()
                .and_then(ElementRef::wrap)
                .filter(|p| !matches!(p.value().name(), "body" | "html"))
                .unwrap_or(row);
            if containers.iter().any(|c| {
                c.id() == container.id() || container.ancestors().any(|a| a.id() == c.id())
            }) {
                continue;
            }
            containers.push(container);

            let Some(selector) = build_selector(doc, &container) else {
                continue;
            };
            let sibling_rows = if container.id() == row.id() {
                0
            } else {
                container
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|r| r.id() != row.id())
                    .filter(|r| r.children().filter_map(ElementRef::wrap).count() == cells.len())
                    .count()
            };
            let row_count = nearby_row_count(&container).unwrap_or(sibling_rows);
            found.push(
                UiElementDescriptor::new(selector, UiRole::Table, ElementKind::Grid, SOURCE)
                    .with_label(accessible_label(doc, &container))
                    .with_headers(texts)
                    .with_row_count(Some(row_count)),
            );
        }
        Ok(())
    }

    fn pagination_links(
        &self,
        doc: &Html,
        found: &mut Vec<UiElementDescriptor>,
    ) -> Result<(), LayerError> {
        let link_sel = css(LAYER, "a, button")?;
        let phrases = &self.conventions.heuristics.pagination_phrases;
        let mut parents: Vec<ElementRef<'_>> = Vec::new();

        for link in doc.select(&link_sel) {
            let text = element_text(&link).to_lowercase();
            let aria = link
                .value()
                .attr("aria-label")
                .map(str::to_lowercase)
                .unwrap_or_default();
            let is_pager = phrases.iter().any(|p| *p == text)
                || aria.contains("next page")
                || aria.contains("previous page");
            if !is_pager {
                continue;
            }
            // Links sit in li/span wrappers; the pager is the first block above.
            let Some(parent) = link
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| !matches!(a.value().name(), "li" | "span"))
                .filter(|p| !matches!(p.value().name(), "body" | "html"))
            else {
                continue;
            };
            if parents.iter().any(|p| p.id() == parent.id()) {
                continue;
            }
            parents.push(parent);

            let Some(selector) = build_selector(doc, &parent) else {
                continue;
            };
            let label = accessible_label(doc, &parent).or_else(|| {
                let text = element_text(&parent);
                (text.chars().count() <= 60).then_some(text)
            });
            found.push(
                UiElementDescriptor::new(
                    selector,
                    UiRole::Pagination,
                    ElementKind::Pagination,
                    SOURCE,
                )
                .with_label(label),
            );
        }
        Ok(())
    }
}

fn starts_with_any(text: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| text.starts_with(p.as_str()))
}

fn inside_table(el: &ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        a.value().name() == "table"
            || matches!(a.value().attr("role"), Some("grid" | "table" | "treegrid"))
    })
}

fn is_interactive(el: &ElementRef<'_>) -> bool {
    let value = el.value();
    match value.name() {
        "select" | "textarea" => return true,
        "input" => {
            let input_type = value.attr("type").unwrap_or("text").to_ascii_lowercase();
            return !matches!(input_type.as_str(), "hidden" | "submit" | "button" | "reset");
        }
        _ => {}
    }
    value
        .attr("role")
        .is_some_and(|r| INTERACTIVE_ROLES.contains(&r))
        || value.attr("contenteditable") == Some("true")
}

/// The control a caption refers to: inside it (a wrapping label), or in
/// one of the next few siblings.
fn nearest_control<'a>(caption: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let first_within = |el: &ElementRef<'a>| {
        el.descendants()
            .filter_map(ElementRef::wrap)
            .find(is_interactive)
    };
    caption
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(is_interactive)
        .or_else(|| {
            caption
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .take(CONTROL_WINDOW)
                .find_map(|sibling| first_within(&sibling))
        })
}

fn control_kind(control: &ElementRef<'_>) -> ElementKind {
    let value = control.value();
    let input_type = value.attr("type").unwrap_or("").to_ascii_lowercase();
    let aria_role = value.attr("role").unwrap_or("");
    match (value.name(), input_type.as_str(), aria_role) {
        ("select", _, _) | (_, _, "combobox" | "listbox") => ElementKind::Dropdown,
        ("input", "checkbox", _) | (_, _, "checkbox") => ElementKind::Checkbox,
        ("input", "radio", _) | (_, _, "radiogroup") => ElementKind::Radio,
        ("input", "range", _) | (_, _, "slider") => ElementKind::Slider,
        ("input", "search", _) | (_, _, "searchbox") => ElementKind::Search,
        _ => ElementKind::Text,
    }
}
