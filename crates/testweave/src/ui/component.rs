//! Detection of widget-library components (Material, Ant, Angular Material,
//! PrimeNG, AG Grid and friends) by class prefix and ARIA role.

use super::conventions::{conventions, ComponentConvention, UiConventions};
use super::counts::nearby_row_count;
use super::selector::{accessible_label, build_selector, element_text, non_blank, preceding_caption};
use super::{css, DetectionLayer, ParsedSnapshot};
use crate::error::LayerError;
use crate::types::{is_concrete_value, DetectionSource, ElementKind, UiElementDescriptor, UiRole};
use scraper::{ElementRef, Html, Selector};

const LAYER: &str = "component_framework";
const SOURCE: DetectionSource = DetectionSource::ComponentFramework;

/// Longest visible text accepted as a label for buttons and paginators.
const MAX_TEXT_LABEL: usize = 60;

/// Detects framework components from the embedded convention table.
pub struct ComponentFrameworkLayer {
    conventions: &'static UiConventions,
}

impl Default for ComponentFrameworkLayer {
    fn default() -> Self {
        Self {
            conventions: conventions(),
        }
    }
}

impl DetectionLayer for ComponentFrameworkLayer {
    fn name(&self) -> &'static str {
        LAYER
    }

    fn detect(&self, snapshot: &ParsedSnapshot) -> Result<Vec<UiElementDescriptor>, LayerError> {
        let doc = snapshot.document();
        let all = css(LAYER, "*")?;
        let option_sel = css(LAYER, r#"[role="option"], option"#)?;
        let input_sel = css(LAYER, "input")?;

        let mut matched: Vec<(ElementRef<'_>, UiRole)> = Vec::new();
        let mut found = Vec::new();

        for el in doc.select(&all) {
            let Some(convention) = self.conventions.components.iter().find(|c| c.matches(&el))
            else {
                continue;
            };
            // Inner parts of an already matched widget carry the same prefix.
            let inside_match = el.ancestors().any(|a| {
                matched
                    .iter()
                    .any(|(m, role)| m.id() == a.id() && *role == convention.role)
            });
            if inside_match {
                continue;
            }
            matched.push((el, convention.role));

            let Some(selector) = build_selector(doc, &el) else {
                tracing::debug!(
                    "{LAYER}: no stable selector for {} component, skipping",
                    convention.kind.as_str()
                );
                continue;
            };

            match convention.role {
                UiRole::Table => self.describe_grid(doc, &el, selector, &mut found),
                _ => found.push(describe_control(
                    doc,
                    &el,
                    convention,
                    selector,
                    &option_sel,
                    &input_sel,
                )),
            }
        }
        Ok(found)
    }
}

fn describe_control(
    doc: &Html,
    el: &ElementRef<'_>,
    convention: &ComponentConvention,
    selector: String,
    option_sel: &Selector,
    input_sel: &Selector,
) -> UiElementDescriptor {
    let inner_input = el.select(input_sel).next();
    let descriptor = UiElementDescriptor::new(selector, convention.role, convention.kind, SOURCE);

    match convention.role {
        UiRole::Filter => {
            let options = el
                .select(option_sel)
                .map(|o| element_text(&o))
                .filter(|t| is_concrete_value(t))
                .collect();
            let label = accessible_label(doc, el)
                .or_else(|| inner_input.and_then(|i| accessible_label(doc, &i)))
                .or_else(|| preceding_caption(el));
            descriptor.with_label(label).with_options(options)
        }
        UiRole::Search => {
            let placeholder = non_blank(el.value().attr("placeholder"))
                .or_else(|| inner_input.and_then(|i| non_blank(i.value().attr("placeholder"))));
            let label = accessible_label(doc, el)
                .or_else(|| inner_input.and_then(|i| accessible_label(doc, &i)))
                .or_else(|| preceding_caption(el));
            descriptor.with_label(label).with_placeholder(placeholder)
        }
        UiRole::Pagination | UiRole::Button => {
            let label = accessible_label(doc, el).or_else(|| short_text(el));
            descriptor.with_label(label)
        }
        _ => descriptor.with_label(accessible_label(doc, el)),
    }
}

impl ComponentFrameworkLayer {
    /// A data grid plus one sortable descriptor per sortable column header.
    fn describe_grid(
        &self,
        doc: &Html,
        grid: &ElementRef<'_>,
        selector: String,
        found: &mut Vec<UiElementDescriptor>,
    ) {
        let mut header_cells: Vec<ElementRef<'_>> = Vec::new();
        for cell in grid.descendants().filter_map(ElementRef::wrap) {
            if !self.conventions.column_headers.matches(&cell) {
                continue;
            }
            // Nested header markers (cell > title > text) count once.
            if header_cells
                .iter()
                .any(|h| cell.ancestors().any(|a| a.id() == h.id()))
            {
                continue;
            }
            header_cells.push(cell);
        }

        let mut headers: Vec<String> = Vec::new();
        for cell in &header_cells {
            let text = element_text(cell);
            if !text.is_empty() && !headers.contains(&text) {
                headers.push(text);
            }
        }

        let data_rows = grid
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|row| self.conventions.rows.matches(row))
            .filter(|row| {
                !row.descendants()
                    .filter_map(ElementRef::wrap)
                    .any(|d| self.conventions.column_headers.matches(&d))
            })
            .count();
        let row_count = nearby_row_count(grid).or((data_rows > 0).then_some(data_rows));

        let label = accessible_label(doc, grid).or_else(|| preceding_caption(grid));
        found.push(
            UiElementDescriptor::new(selector, UiRole::Table, ElementKind::Grid, SOURCE)
                .with_label(label)
                .with_headers(headers)
                .with_row_count(row_count),
        );

        for cell in header_cells {
            let sortable = self.conventions.has_sort_class(&cell)
                || cell
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .any(|d| self.conventions.has_sort_class(&d));
            if !sortable {
                continue;
            }
            let Some(cell_selector) = build_selector(doc, &cell) else {
                continue;
            };
            found.push(
                UiElementDescriptor::new(
                    cell_selector,
                    UiRole::Sortable,
                    ElementKind::Header,
                    SOURCE,
                )
                .with_label(Some(element_text(&cell))),
            );
        }
    }
}

fn short_text(el: &ElementRef<'_>) -> Option<String> {
    let text = element_text(el);
    (!text.is_empty() && text.chars().count() <= MAX_TEXT_LABEL).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MarkupSnapshot;

    fn detect(markup: &str) -> Vec<UiElementDescriptor> {
        let snapshot = ParsedSnapshot::parse(&MarkupSnapshot::Markup(markup.to_string()));
        ComponentFrameworkLayer::default().detect(&snapshot).unwrap()
    }

    #[test]
    fn test_framework_dropdown_with_caption() {
        let found = detect(
            r#"<div class="field"><label>Breed</label>
              <div class="ant-select ant-select-single" data-testid="breed">
                <div class="ant-select-selector">
                  <span class="ant-select-selection-item">Poodle</span>
                </div>
              </div></div>"#,
        );
        assert_eq!(found.len(), 1);
        let d = &found[0];
        assert_eq!(d.role, UiRole::Filter);
        assert_eq!(d.kind, ElementKind::Dropdown);
        assert_eq!(d.selector, r#"div[data-testid="breed"]"#);
        assert_eq!(d.label.as_deref(), Some("Breed"));
        assert_eq!(d.source, DetectionSource::ComponentFramework);
    }

    #[test]
    fn test_listbox_options() {
        let found = detect(
            r#"<ul role="listbox" aria-label="Color" id="color">
              <li role="option">Black</li><li role="option">Brown</li></ul>"#,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].options, vec!["Black", "Brown"]);
        assert_eq!(found[0].label.as_deref(), Some("Color"));
    }

    #[test]
    fn test_search_component_placeholder_from_input() {
        let found = detect(
            r#"<span class="ant-input-search" id="dog-search">
                 <input placeholder="Search by name">
               </span>"#,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].role, UiRole::Search);
        assert_eq!(found[0].placeholder.as_deref(), Some("Search by name"));
    }

    #[test]
    fn test_data_grid_headers_rows_and_sortables() {
        let found = detect(
            r#"<div class="MuiDataGrid-root" id="dogs-grid" aria-label="Dogs">
              <div role="row">
                <div role="columnheader" class="MuiDataGrid-columnHeader--sortable"
                     data-field="name">Name</div>
                <div role="columnheader" data-field="breed">Breed</div>
              </div>
              <div role="row"><div role="cell">Rex</div><div role="cell">Lab</div></div>
              <div role="row"><div role="cell">Fido</div><div role="cell">Pug</div></div>
              <div role="row"><div role="cell">Ace</div><div role="cell">Pug</div></div>
            </div>"#,
        );
        let tables: Vec<_> = found.iter().filter(|d| d.role == UiRole::Table).collect();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].kind, ElementKind::Grid);
        assert_eq!(tables[0].headers, vec!["Name", "Breed"]);
        assert_eq!(tables[0].row_count, Some(3));
        assert_eq!(tables[0].label.as_deref(), Some("Dogs"));

        let sortable: Vec<_> = found.iter().filter(|d| d.role == UiRole::Sortable).collect();
        assert_eq!(sortable.len(), 1);
        assert_eq!(sortable[0].selector, r#"div[data-field="name"]"#);
    }

    #[test]
    fn test_grid_header_with_only_aria_sort_is_not_sortable() {
        let found = detect(
            r#"<div class="MuiDataGrid-root" id="dogs-grid">
              <div role="row">
                <div role="columnheader" aria-sort="ascending" data-field="name">Name</div>
                <div role="columnheader" data-field="breed">Breed</div>
              </div>
              <div role="row"><div role="cell">Rex</div><div role="cell">Lab</div></div>
            </div>"#,
        );
        assert_eq!(found.iter().filter(|d| d.role == UiRole::Table).count(), 1);
        assert!(found.iter().all(|d| d.role != UiRole::Sortable));
    }

    #[test]
    fn test_nested_parts_are_not_reported_twice() {
        let found = detect(
            r#"<nav class="MuiPagination-root" aria-label="pages">
              <ul class="MuiPagination-ul">
                <li><button class="MuiPaginationItem-root">1</button></li>
              </ul>
            </nav>"#,
        );
        let pagination: Vec<_> = found
            .iter()
            .filter(|d| d.role == UiRole::Pagination)
            .collect();
        assert_eq!(pagination.len(), 1);
        assert_eq!(pagination[0].label.as_deref(), Some("pages"));
    }

    #[test]
    fn test_plain_markup_is_ignored() {
        assert!(detect(r#"<div class="card"><p>Hello</p></div>"#).is_empty());
    }
}
