//! Best-effort row counts from the count text pages print around tables
//! ("1–10 of 57", "42 results").

use super::selector::element_text;
use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

/// Longest text block considered a count caption.
const MAX_CAPTION_CHARS: usize = 200;

/// Siblings inspected on each side of the table and of its parent.
const SIBLING_WINDOW: usize = 3;

fn of_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b\d[\d,]*\s*(?:[-–]\s*\d[\d,]*\s*)?of\s+(\d[\d,]*)\b")
            .expect("of-total regex is valid")
    })
}

fn n_rows_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d[\d,]*)\s+(?:rows?|results?|records?|entries|items?)\b")
            .expect("n-rows regex is valid")
    })
}

/// Parse a total row count out of caption text.
///
/// `"N of M"` yields `M`; `"N rows"` (or results/records/entries/items) yields `N`.
pub fn parse_count_text(text: &str) -> Option<usize> {
    let capture = of_total_re()
        .captures(text)
        .or_else(|| n_rows_re().captures(text))?;
    capture
        .get(1)?
        .as_str()
        .replace(',', "")
        .parse::<usize>()
        .ok()
}

/// Look for count text next to `el` and next to its parent.
pub fn nearby_row_count(el: &ElementRef<'_>) -> Option<usize> {
    sibling_count(el).or_else(|| {
        let parent = el.parent().and_then(ElementRef::wrap)?;
        if matches!(parent.value().name(), "body" | "html") {
            return None;
        }
        sibling_count(&parent)
    })
}

fn sibling_count(el: &ElementRef<'_>) -> Option<usize> {
    let before = el
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .take(SIBLING_WINDOW);
    let after = el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(SIBLING_WINDOW);
    after.chain(before).find_map(|sibling| {
        let text = element_text(&sibling);
        if text.chars().count() > MAX_CAPTION_CHARS {
            return None;
        }
        parse_count_text(&text)
    })
}
