//! Merging descriptors from several detection layers into one `UiPatterns`.
//!
//! Layers are merged in order and the first descriptor for a key wins. The
//! key is the role plus the normalized label, or the role plus the selector
//! when there is no label. Two descriptors with the same role and selector
//! point at the same element and are always collapsed.

use crate::types::{UiElementDescriptor, UiPatterns, UiRole};
use std::collections::HashSet;

/// Identity of a descriptor for de-duplication across layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MergeKey {
    Label(UiRole, String),
    Selector(UiRole, String),
}

/// Canonical merge key of a descriptor.
pub fn merge_key(descriptor: &UiElementDescriptor) -> MergeKey {
    match descriptor.label.as_deref().map(normalize_label) {
        Some(label) if !label.is_empty() => MergeKey::Label(descriptor.role, label),
        _ => selector_key(descriptor),
    }
}

fn selector_key(descriptor: &UiElementDescriptor) -> MergeKey {
    MergeKey::Selector(descriptor.role, descriptor.selector.trim().to_string())
}

/// Lowercase, drop a trailing colon, collapse whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Merge per-layer results, earlier layers first.
pub fn merge_layers(detected: Vec<(&'static str, Vec<UiElementDescriptor>)>) -> UiPatterns {
    let mut seen: HashSet<MergeKey> = HashSet::new();
    let mut patterns = UiPatterns::default();

    for (layer, descriptors) in detected {
        for descriptor in descriptors {
            if !descriptor.has_valid_selector() {
                tracing::debug!(
                    "{layer}: dropping descriptor with invalid selector {:?}",
                    descriptor.selector
                );
                continue;
            }
            let key = merge_key(&descriptor);
            let same_element = selector_key(&descriptor);
            if seen.contains(&key) || seen.contains(&same_element) {
                tracing::debug!("{layer}: {key:?} already detected by an earlier layer");
                continue;
            }
            seen.insert(key);
            seen.insert(same_element);
            patterns.push(descriptor);
        }
    }
    patterns
}
