//! Dataset Module - Synthetic training data
//!
//! - `profile`: per-class feature distributions
//! - `generator`: labelled 30-day sequences drawn from the class prior
//! - `split`: sequential and stratified splits
//! - `record` / `writer` / `export`: versioned JSONL files with rotation

pub mod profile;
pub mod generator;
pub mod split;
pub mod record;
pub mod writer;
pub mod export;

#[cfg(test)]
mod tests;

use std::io;
use std::path::PathBuf;

pub use generator::SequenceGenerator;
pub use profile::{default_profiles, training_profiles, ClassProfile, FeatureDistribution};
pub use record::DatasetRecord;
pub use split::{sequential_split, stratified_split, Samples};
pub use writer::DatasetWriter;

/// Default directory for exported datasets
pub fn get_dataset_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("oasis")
        .join("dataset")
}

/// Write every sample as a record; returns how many were written
pub fn write_samples(writer: &DatasetWriter, samples: &Samples) -> io::Result<usize> {
    let records: Vec<DatasetRecord> = samples
        .sequences
        .iter()
        .zip(samples.labels.iter())
        .map(|(sequence, label)| DatasetRecord::new(sequence, *label))
        .collect();

    let written = writer.append_all(&records)?;
    log::info!("Wrote {} records to {}", written, writer.base_dir().display());
    Ok(written)
}
