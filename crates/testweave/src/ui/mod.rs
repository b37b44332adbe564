//! UI pattern classification over markup snapshots.
//!
//! Three detection layers run in a fixed order (native markup, component
//! framework conventions, text heuristics) and their results are merged
//! with earlier layers taking precedence.

pub mod classifier;
pub mod component;
pub mod conventions;
pub mod counts;
pub mod heuristic;
pub mod merge;
pub mod native;
pub mod selector;
pub mod snapshot;

pub use classifier::{classify_ui, UiPatternClassifier};
pub use snapshot::{DomNode, MarkupSnapshot, ParsedSnapshot};

use crate::error::LayerError;
use crate::types::UiElementDescriptor;
use scraper::Selector;

/// One strategy for recognising interactive elements in a parsed snapshot.
pub trait DetectionLayer: Send + Sync {
    /// Stable layer name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Descriptors found by this layer, in document order.
    fn detect(&self, snapshot: &ParsedSnapshot) -> Result<Vec<UiElementDescriptor>, LayerError>;
}

/// Compile a CSS selector a layer relies on.
pub(crate) fn css(layer: &'static str, pattern: &str) -> Result<Selector, LayerError> {
    Selector::parse(pattern).map_err(|_| LayerError::InvalidPattern {
        layer,
        pattern: pattern.to_string(),
    })
}
