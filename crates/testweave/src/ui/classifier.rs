//! UI pattern classifier: runs the detection layers over one snapshot and
//! merges what they find.

use super::component::ComponentFrameworkLayer;
use super::heuristic::HeuristicTextLayer;
use super::merge::merge_layers;
use super::native::NativeMarkupLayer;
use super::{DetectionLayer, MarkupSnapshot, ParsedSnapshot};
use crate::types::UiPatterns;

/// Layered UI classifier. Layer order is merge precedence.
pub struct UiPatternClassifier {
    layers: Vec<Box<dyn DetectionLayer>>,
}

impl Default for UiPatternClassifier {
    fn default() -> Self {
        Self::with_layers(vec![
            Box::new(NativeMarkupLayer),
            Box::new(ComponentFrameworkLayer::default()),
            Box::new(HeuristicTextLayer::default()),
        ])
    }
}

impl UiPatternClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers(layers: Vec<Box<dyn DetectionLayer>>) -> Self {
        Self { layers }
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Classify a snapshot. A blank or element-free snapshot yields empty
    /// patterns; a failing layer is logged and skipped.
    pub fn classify(&self, snapshot: &MarkupSnapshot) -> UiPatterns {
        if snapshot.is_blank() {
            tracing::debug!("ui classifier: blank snapshot");
            return UiPatterns::default();
        }
        let parsed = ParsedSnapshot::parse(snapshot);
        if parsed.element_count() == 0 {
            tracing::debug!("ui classifier: snapshot has no elements");
            return UiPatterns::default();
        }

        let mut detected = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            match layer.detect(&parsed) {
                Ok(descriptors) => {
                    tracing::debug!("{}: {} descriptors", layer.name(), descriptors.len());
                    detected.push((layer.name(), descriptors));
                }
                Err(e) => tracing::warn!("{} layer failed, skipping: {e}", layer.name()),
            }
        }

        let patterns = merge_layers(detected);
        tracing::info!(
            "ui classifier: {} filters, {} search, {} tables, {} sortable, \
             {} pagination, {} buttons, {} forms",
            patterns.filters.len(),
            patterns.search.len(),
            patterns.tables.len(),
            patterns.sortable.len(),
            patterns.pagination.len(),
            patterns.buttons.len(),
            patterns.forms.len()
        );
        patterns
    }
}

/// Classify a snapshot with the default layers.
pub fn classify_ui(snapshot: &MarkupSnapshot) -> UiPatterns {
    UiPatternClassifier::default().classify(snapshot)
}
