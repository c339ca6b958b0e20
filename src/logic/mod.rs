//! Logic Module - Scoring pipeline
//!
//! - `features/` - Feature layout, day vectors, 30-day sequences
//! - `risk/` - Risk classes, labels, score tables
//! - `dataset/` - Synthetic generator, splits, JSONL export
//! - `model/` - Classifier, training, persistence, scorers

pub mod config;
pub mod features;
pub mod risk;
pub mod dataset;
pub mod model;
