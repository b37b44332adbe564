//! Selector construction, validation and label lookup shared by all layers.
//!
//! Selectors are built from the most stable signal available: a hand-written
//! id, a test id or accessible label, a form name, a single non-generated
//! class, and finally a structural `nth-of-type` path. Every candidate except
//! the structural path is checked to resolve to exactly one element.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Attributes tried (in order) after the element id.
const STABLE_ATTRIBUTES: &[&str] = &[
    "data-testid",
    "data-test-id",
    "data-test",
    "data-cy",
    "data-qa",
    "aria-label",
    "name",
    "data-field",
    "data-column",
    "col-id",
    "data-sort-key",
    "placeholder",
];

/// Whether a selector can be handed to an execution collaborator.
pub fn is_valid_selector(selector: &str) -> bool {
    let trimmed = selector.trim();
    !trimmed.is_empty() && !names_undefined(trimmed) && Selector::parse(trimmed).is_ok()
}

/// Whether an id, class, tag or attribute value in the selector is exactly
/// `undefined`, as left behind by a stringified missing value.
fn names_undefined(selector: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^A-Za-z0-9_-])undefined(?:$|[^A-Za-z0-9_-])")
            .expect("undefined token regex is valid")
    })
    .is_match(selector)
}

/// Build the most stable selector that resolves to exactly `el`.
pub fn build_selector(document: &Html, el: &ElementRef<'_>) -> Option<String> {
    let tag = el.value().name();

    if let Some(id) = el.value().id() {
        if !is_generated_id(id) {
            let candidate = if is_css_identifier(id) {
                Some(format!("#{id}"))
            } else {
                attribute_selector(tag, "id", id)
            };
            if let Some(candidate) = candidate {
                if resolves_uniquely(document, &candidate, el) {
                    return Some(candidate);
                }
            }
        }
    }

    for attr in STABLE_ATTRIBUTES {
        if let Some(value) = el.value().attr(attr) {
            if let Some(candidate) = attribute_selector(tag, attr, value) {
                if resolves_uniquely(document, &candidate, el) {
                    return Some(candidate);
                }
            }
        }
    }

    for class in el.value().classes() {
        if is_generated_class(class) || !is_css_identifier(class) {
            continue;
        }
        let candidate = format!("{tag}.{class}");
        if resolves_uniquely(document, &candidate, el) {
            return Some(candidate);
        }
    }

    let path = structural_path(el);
    is_valid_selector(&path).then_some(path)
}

/// `tag[attr="value"]`, or `None` when the value cannot be quoted safely.
pub fn attribute_selector(tag: &str, attr: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.contains(['"', '\\', '\n', '\r']) {
        return None;
    }
    Some(format!("{tag}[{attr}=\"{value}\"]"))
}

/// A `>`-joined `nth-of-type` path from `body` (or the nearest stable id) to `el`.
pub fn structural_path(el: &ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(*el);

    while let Some(node) = current {
        let name = node.value().name();
        if name == "html" {
            break;
        }
        if node.id() != el.id() {
            if let Some(id) = node.value().id() {
                if is_css_identifier(id) && !is_generated_id(id) && !names_undefined(id) {
                    segments.push(format!("#{id}"));
                    break;
                }
            }
        }
        if name == "body" {
            segments.push("body".to_string());
            break;
        }
        segments.push(format!("{name}:nth-of-type({})", position_of_type(&node)));
        current = node.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    segments.join(" > ")
}

/// 1-based index of `el` among its same-tag siblings.
fn position_of_type(el: &ElementRef<'_>) -> usize {
    let name = el.value().name();
    let Some(parent) = el.parent() else {
        return 1;
    };
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| sibling.value().name() == name)
        .position(|sibling| sibling.id() == el.id())
        .map_or(1, |i| i + 1)
}

fn resolves_uniquely(document: &Html, candidate: &str, el: &ElementRef<'_>) -> bool {
    if !is_valid_selector(candidate) {
        return false;
    }
    let Ok(selector) = Selector::parse(candidate) else {
        return false;
    };
    let mut matches = document.select(&selector);
    matches.next().map(|m| m.id()) == Some(el.id()) && matches.next().is_none()
}

/// Plain CSS identifier that needs no escaping.
pub fn is_css_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some('-') => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Class names emitted by CSS-in-JS tooling; they change between builds.
pub fn is_generated_class(class: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:(?:css|sc|jss|emotion|styled|svelte)-[A-Za-z0-9_-]+",
            r"|jss\d+|_[A-Za-z0-9]{5,}|.*-\d+)$",
        ))
        .expect("generated class regex is valid")
    })
    .is_match(class)
}

/// Ids minted by component libraries at render time.
fn is_generated_id(id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?::r[0-9a-z]+:|(?:mui|rc|react-select|ember|headlessui|radix)[-_:].*\d.*)$")
            .expect("generated id regex is valid")
    })
    .is_match(id)
}

// ── Text and label helpers ──────────────────────────────────────────────────

/// All visible text of an element, whitespace-collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text directly inside an element, excluding descendants' text.
pub fn own_text(el: &ElementRef<'_>) -> String {
    el.children()
        .filter_map(|child| child.value().as_text().map(|t| String::from(&**t)))
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accessible name of a control: `aria-label`, `aria-labelledby`, an explicit
/// `<label for>`, a wrapping `<label>`, or `title`.
pub fn accessible_label(document: &Html, el: &ElementRef<'_>) -> Option<String> {
    if let Some(label) = non_blank(el.value().attr("aria-label")) {
        return Some(label);
    }

    if let Some(ids) = el.value().attr("aria-labelledby") {
        let text: Vec<String> = ids
            .split_whitespace()
            .filter_map(|id| find_by_attr(document, "*", "id", id))
            .map(|target| element_text(&target))
            .filter(|t| !t.is_empty())
            .collect();
        if !text.is_empty() {
            return Some(text.join(" "));
        }
    }

    if let Some(id) = el.value().id() {
        if let Some(label) = find_by_attr(document, "label", "for", id) {
            let text = element_text(&label);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    let wrapping = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label");
    if let Some(label) = wrapping {
        let text = own_text(&label);
        let text = if text.is_empty() { element_text(&label) } else { text };
        if !text.is_empty() {
            return Some(text);
        }
    }

    non_blank(el.value().attr("title"))
}

/// Short caption text in the element just before `el` (a visible label that
/// is not wired up with `for`).
pub fn preceding_caption(el: &ElementRef<'_>) -> Option<String> {
    let previous = el.prev_siblings().find_map(ElementRef::wrap)?;
    if !matches!(
        previous.value().name(),
        "label" | "span" | "strong" | "b" | "p" | "div" | "legend" | "h1" | "h2" | "h3" | "h4"
            | "h5" | "h6" | "dt"
    ) {
        return None;
    }
    let text = element_text(&previous);
    let text = text.trim_end_matches(':').trim().to_string();
    (!text.is_empty() && text.chars().count() <= 40).then_some(text)
}

/// First element matching `tag[attr="value"]`.
pub fn find_by_attr<'a>(
    document: &'a Html,
    tag: &str,
    attr: &str,
    value: &str,
) -> Option<ElementRef<'a>> {
    let selector = attribute_selector(tag, attr, value)?;
    let selector = Selector::parse(&selector).ok()?;
    document.select(&selector).next()
}

/// Trimmed attribute value, `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
