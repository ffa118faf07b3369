//! Structural diff and semantic classification of resource sets.
//!
//! # Architecture
//!
//! - [`DiffEngine`] matches resources by `(kind, name)` and asks each
//!   registered [`FieldComparator`](traits::FieldComparator) for field-level
//!   disagreements, producing a [`ResourceDiff`].
//! - [`SemanticClassifier`] tags every difference as breaking or cosmetic
//!   and decides whether the two sets are still equivalent.
//!
//! # Example
//!
//! ```ignore
//! use fabric_drift::diff::{DiffEngine, SemanticClassifier};
//!
//! let diff = DiffEngine::new().compare(&expected, &actual);
//! println!("{} missing", diff.missing.len());
//!
//! let classification = SemanticClassifier::default().classify(&expected, &actual);
//! if !classification.is_valid {
//!     for error in &classification.errors {
//!         eprintln!("{error}");
//!     }
//! }
//! ```

mod engine;
mod result;
mod semantic;
pub mod traits;

pub use engine::{DiffEngine, DiffOptions};
pub use result::{DiffField, FieldDifference, ResourceDiff, ResourceDifference, ABSENT};
pub use semantic::{
    ChangeKind, Classification, ClassifierConfig, Impact, SemanticClassifier, SemanticDifference,
    DEFAULT_COSMETIC_LABELS, DEFAULT_STRUCTURAL_KINDS,
};
pub use traits::{ApiVersionComparator, FieldComparator, LabelComparator};
