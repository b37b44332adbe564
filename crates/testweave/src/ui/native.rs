//! Native HTML control detection: `select`, toggle inputs, range sliders,
//! search inputs, `table`, buttons and forms.

use super::conventions::conventions;
use super::counts::nearby_row_count;
use super::selector::{
    accessible_label, attribute_selector, build_selector, element_text, non_blank,
    preceding_caption,
};
use super::{css, DetectionLayer, ParsedSnapshot};
use crate::error::LayerError;
use crate::types::{is_concrete_value, DetectionSource, ElementKind, UiElementDescriptor, UiRole};
use scraper::{ElementRef, Html};

const LAYER: &str = "native_markup";
const SOURCE: DetectionSource = DetectionSource::NativeMarkup;

/// Input names that mark a plain text box as a search box.
const SEARCH_NAMES: &[&str] = &["q", "query", "keyword", "keywords", "term"];

/// Detects standard form controls and tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeMarkupLayer;

impl DetectionLayer for NativeMarkupLayer {
    fn name(&self) -> &'static str {
        LAYER
    }

    fn detect(&self, snapshot: &ParsedSnapshot) -> Result<Vec<UiElementDescriptor>, LayerError> {
        let doc = snapshot.document();
        let mut found = Vec::new();
        detect_selects(doc, &mut found)?;
        detect_toggle_groups(doc, &mut found)?;
        detect_sliders(doc, &mut found)?;
        detect_search_inputs(doc, &mut found)?;
        detect_tables(doc, &mut found)?;
        detect_buttons(doc, &mut found)?;
        detect_forms(doc, &mut found)?;
        Ok(found)
    }
}

fn control_label(doc: &Html, el: &ElementRef<'_>) -> Option<String> {
    accessible_label(doc, el).or_else(|| preceding_caption(el))
}

fn detect_selects(doc: &Html, found: &mut Vec<UiElementDescriptor>) -> Result<(), LayerError> {
    let select_sel = css(LAYER, "select")?;
    let option_sel = css(LAYER, "option")?;

    for el in doc.select(&select_sel) {
        let Some(selector) = build_selector(doc, &el) else {
            tracing::debug!("{LAYER}: no stable selector for <select>, skipping");
            continue;
        };
        // Options with an empty value are "choose one" prompts.
        let options = el
            .select(&option_sel)
            .filter(|o| o.value().attr("value").map_or(true, |v| !v.trim().is_empty()))
            .map(|o| element_text(&o))
            .filter(|t| is_concrete_value(t))
            .collect();
        found.push(
            UiElementDescriptor::new(selector, UiRole::Filter, ElementKind::Dropdown, SOURCE)
                .with_label(control_label(doc, &el))
                .with_options(options),
        );
    }
    Ok(())
}

struct ToggleGroup<'a> {
    input_type: String,
    name: Option<String>,
    members: Vec<ElementRef<'a>>,
}

fn detect_toggle_groups(
    doc: &Html,
    found: &mut Vec<UiElementDescriptor>,
) -> Result<(), LayerError> {
    let toggle_sel = css(LAYER, r#"input[type="checkbox"], input[type="radio"]"#)?;

    let mut groups: Vec<ToggleGroup<'_>> = Vec::new();
    for el in doc.select(&toggle_sel) {
        let input_type = el
            .value()
            .attr("type")
            .unwrap_or("checkbox")
            .to_ascii_lowercase();
        let name = non_blank(el.value().attr("name"));
        let existing = name.as_ref().and_then(|n| {
            groups
                .iter_mut()
                .find(|g| g.input_type == input_type && g.name.as_ref() == Some(n))
        });
        match existing {
            Some(group) => group.members.push(el),
            None => groups.push(ToggleGroup {
                input_type,
                name,
                members: vec![el],
            }),
        }
    }

    for group in groups {
        let first = group.members[0];
        let kind = if group.input_type == "radio" {
            ElementKind::Radio
        } else {
            ElementKind::Checkbox
        };

        let selector = match (&group.name, group.members.len()) {
            (Some(name), n) if n > 1 => {
                attribute_selector("input", "name", name).map(|by_name| {
                    by_name.replacen("input", &format!("input[type=\"{}\"]", group.input_type), 1)
                })
            }
            _ => None,
        }
        .or_else(|| build_selector(doc, &first));
        let Some(selector) = selector else {
            tracing::debug!("{LAYER}: no stable selector for {} group", group.input_type);
            continue;
        };

        let options: Vec<String> = group
            .members
            .iter()
            .filter_map(|m| {
                accessible_label(doc, m)
                    .or_else(|| non_blank(m.value().attr("value")))
            })
            .filter(|o| is_concrete_value(o))
            .collect();

        let label = group_label(doc, &group.members);
        found.push(
            UiElementDescriptor::new(selector, UiRole::Filter, kind, SOURCE)
                .with_label(label)
                .with_options(options),
        );
    }
    Ok(())
}

/// Label of a toggle group: its `fieldset` legend, a labelled `role="group"`
/// ancestor, or the caption of a lone control.
fn group_label(doc: &Html, members: &[ElementRef<'_>]) -> Option<String> {
    let first = members.first()?;
    for ancestor in first.ancestors().filter_map(ElementRef::wrap) {
        match ancestor.value().name() {
            "fieldset" => {
                let legend = ancestor
                    .children()
                    .filter_map(ElementRef::wrap)
                    .find(|c| c.value().name() == "legend")
                    .map(|l| element_text(&l))
                    .filter(|t| !t.is_empty());
                if legend.is_some() {
                    return legend;
                }
            }
            "form" | "body" => break,
            _ => {}
        }
        if matches!(ancestor.value().attr("role"), Some("group" | "radiogroup")) {
            if let Some(label) = accessible_label(doc, &ancestor) {
                return Some(label);
            }
        }
    }
    if members.len() == 1 {
        return control_label(doc, first);
    }
    first
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|p| preceding_caption(&p))
}

fn detect_sliders(doc: &Html, found: &mut Vec<UiElementDescriptor>) -> Result<(), LayerError> {
    let range_sel = css(LAYER, r#"input[type="range"]"#)?;
    for el in doc.select(&range_sel) {
        let Some(selector) = build_selector(doc, &el) else {
            continue;
        };
        found.push(
            UiElementDescriptor::new(selector, UiRole::Filter, ElementKind::Slider, SOURCE)
                .with_label(control_label(doc, &el)),
        );
    }
    Ok(())
}

fn detect_search_inputs(
    doc: &Html,
    found: &mut Vec<UiElementDescriptor>,
) -> Result<(), LayerError> {
    let input_sel = css(LAYER, "input")?;
    for el in doc.select(&input_sel) {
        let input_type = el.value().attr("type").unwrap_or("text").to_ascii_lowercase();
        let kind = match input_type.as_str() {
            "search" => ElementKind::Search,
            "text" | "" if mentions_search(&el) => ElementKind::Text,
            _ => continue,
        };
        let Some(selector) = build_selector(doc, &el) else {
            continue;
        };
        found.push(
            UiElementDescriptor::new(selector, UiRole::Search, kind, SOURCE)
                .with_label(control_label(doc, &el))
                .with_placeholder(non_blank(el.value().attr("placeholder"))),
        );
    }
    Ok(())
}

fn mentions_search(el: &ElementRef<'_>) -> bool {
    let attrs = ["name", "id", "placeholder", "aria-label", "class"];
    let mentions = attrs.iter().any(|attr| {
        el.value()
            .attr(attr)
            .is_some_and(|v| v.to_ascii_lowercase().contains("search"))
    });
    mentions
        || el
            .value()
            .attr("name")
            .is_some_and(|n| SEARCH_NAMES.contains(&n.to_ascii_lowercase().as_str()))
}

fn detect_tables(doc: &Html, found: &mut Vec<UiElementDescriptor>) -> Result<(), LayerError> {
    let table_sel = css(LAYER, "table")?;
    let head_sel = css(LAYER, "thead th")?;
    let row_sel = css(LAYER, "tr")?;
    let body_row_sel = css(LAYER, "tbody tr")?;
    let th_sel = css(LAYER, "th")?;
    let caption_sel = css(LAYER, "caption")?;

    for table in doc.select(&table_sel) {
        let Some(selector) = build_selector(doc, &table) else {
            continue;
        };

        let mut headers: Vec<String> = table
            .select(&head_sel)
            .map(|th| element_text(&th))
            .filter(|t| !t.is_empty())
            .collect();
        let mut header_in_body = false;
        if headers.is_empty() {
            if let Some(first_row) = table.select(&row_sel).next() {
                headers = first_row
                    .select(&th_sel)
                    .map(|th| element_text(&th))
                    .filter(|t| !t.is_empty())
                    .collect();
                header_in_body = !headers.is_empty();
            }
        }

        let body_rows = table.select(&body_row_sel).count();
        let body_rows = if body_rows > 0 && !header_in_body {
            body_rows
        } else {
            let all = table.select(&row_sel).count();
            all.saturating_sub(usize::from(header_in_body || !headers.is_empty()))
        };
        let row_count = nearby_row_count(&table).unwrap_or(body_rows);

        let label = table
            .select(&caption_sel)
            .next()
            .map(|c| element_text(&c))
            .filter(|t| !t.is_empty())
            .or_else(|| accessible_label(doc, &table))
            .or_else(|| preceding_heading(&table));

        found.push(
            UiElementDescriptor::new(selector, UiRole::Table, ElementKind::Table, SOURCE)
                .with_label(label)
                .with_headers(headers)
                .with_row_count(Some(row_count)),
        );

        for th in table.select(&th_sel) {
            if !conventions().has_sort_class(&th) {
                continue;
            }
            let Some(th_selector) = build_selector(doc, &th) else {
                continue;
            };
            let text = element_text(&th);
            found.push(
                UiElementDescriptor::new(th_selector, UiRole::Sortable, ElementKind::Header, SOURCE)
                    .with_label(Some(text)),
            );
        }
    }
    Ok(())
}

fn preceding_heading(el: &ElementRef<'_>) -> Option<String> {
    el.prev_siblings()
        .filter_map(ElementRef::wrap)
        .take(2)
        .find(|s| matches!(s.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
        .map(|h| element_text(&h))
        .filter(|t| !t.is_empty())
}

fn detect_buttons(doc: &Html, found: &mut Vec<UiElementDescriptor>) -> Result<(), LayerError> {
    let button_sel = css(
        LAYER,
        r#"button, input[type="submit"], input[type="button"]"#,
    )?;
    for el in doc.select(&button_sel) {
        let Some(selector) = build_selector(doc, &el) else {
            continue;
        };
        let text = element_text(&el);
        let label = if text.is_empty() {
            non_blank(el.value().attr("value")).or_else(|| accessible_label(doc, &el))
        } else {
            Some(text)
        };
        found.push(
            UiElementDescriptor::new(selector, UiRole::Button, ElementKind::Button, SOURCE)
                .with_label(label),
        );
    }
    Ok(())
}

fn detect_forms(doc: &Html, found: &mut Vec<UiElementDescriptor>) -> Result<(), LayerError> {
    let form_sel = css(LAYER, "form")?;
    let field_sel = css(LAYER, "input, select, textarea")?;
    let legend_sel = css(LAYER, "legend")?;

    for form in doc.select(&form_sel) {
        let Some(selector) = build_selector(doc, &form) else {
            continue;
        };
        let mut fields: Vec<String> = Vec::new();
        for field in form.select(&field_sel) {
            let input_type = field.value().attr("type").unwrap_or("").to_ascii_lowercase();
            if matches!(input_type.as_str(), "hidden" | "submit" | "button" | "reset") {
                continue;
            }
            if let Some(name) = non_blank(field.value().attr("name")) {
                if !fields.contains(&name) {
                    fields.push(name);
                }
            }
        }
        let label = accessible_label(doc, &form).or_else(|| {
            form.select(&legend_sel)
                .next()
                .map(|l| element_text(&l))
                .filter(|t| !t.is_empty())
        });
        found.push(
            UiElementDescriptor::new(selector, UiRole::Form, ElementKind::Form, SOURCE)
                .with_label(label)
                .with_fields(fields),
        );
    }
    Ok(())
}
