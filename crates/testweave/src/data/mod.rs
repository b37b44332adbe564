//! Tabular data classification: field profiling, category tagging and
//! relationship inference.

pub mod classifier;
pub mod relationships;
pub mod values;

pub use classifier::{classify_data, DataPatternClassifier};
