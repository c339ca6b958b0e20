//! Features Module - Feature schema for the burnout classifier
//!
//! - `layout`: versioned feature ordering and layout hash
//! - `vector`: one day of work behaviour (`FeatureVector`, `WorkPattern`)
//! - `sequence`: the 30-day classifier input and the jitter pseudo-history

pub mod layout;
pub mod vector;
pub mod sequence;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_VERSION, SEQUENCE_LENGTH, LayoutInfo, LayoutMismatchError, layout_hash};
pub use vector::{FeatureVector, FeatureVectorBuilder, WorkPattern};
pub use sequence::{DayVector, Sequence};
