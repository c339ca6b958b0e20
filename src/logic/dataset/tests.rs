use std::fs;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use super::export::{read_jsonl, to_jsonl, to_samples};
use super::record::DatasetRecord;
use super::writer::DatasetWriter;
use super::{training_profiles, write_samples, Samples, SequenceGenerator};
use crate::logic::features::layout::{IDX_HOURS_WORKED, IDX_MEETINGS_COUNT};
use crate::logic::features::{layout_hash, FEATURE_COUNT, FEATURE_VERSION, SEQUENCE_LENGTH};
use crate::logic::risk::rules::CLASS_PRIORS;
use crate::logic::risk::{RiskClass, RISK_CLASS_COUNT};

fn record(seed: u64) -> DatasetRecord {
    let mut generator = SequenceGenerator::with_seed(seed).unwrap();
    let (sequences, labels) = generator.generate(1);
    DatasetRecord::new(&sequences[0], labels[0])
}

#[test]
fn test_dataset_append_and_read() {
    let dir = tempdir().unwrap();
    let writer = DatasetWriter::from_path(dir.path().to_path_buf()).unwrap();

    let original = record(1);
    writer.append(&original).unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap()).collect();
    assert_eq!(entries.len(), 1);
    let path = entries[0].path();
    assert!(path.extension().unwrap() == "jsonl");

    let records = read_jsonl(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], original);
    assert_eq!(records[0].feature_version, FEATURE_VERSION);
    assert_eq!(records[0].layout_hash, layout_hash());
    assert_eq!(records[0].days.len(), SEQUENCE_LENGTH);
}

#[test]
fn test_rotation_creates_new_file() {
    let dir = tempdir().unwrap();
    // Any single record exceeds 1 KB, so every append after the first rotates
    let writer = DatasetWriter::from_path(dir.path().to_path_buf())
        .unwrap()
        .with_max_file_size(1024);

    for seed in 0..3 {
        writer.append(&record(seed)).unwrap();
    }

    let stats = writer.get_stats().unwrap();
    assert_eq!(stats.total_files, 3);
    assert!(stats.current_file.ends_with("0002.jsonl"));
}

#[test]
fn test_writer_resumes_latest_file() {
    let dir = tempdir().unwrap();
    {
        let writer = DatasetWriter::from_path(dir.path().to_path_buf()).unwrap();
        writer.append(&record(1)).unwrap();
    }
    let writer = DatasetWriter::from_path(dir.path().to_path_buf()).unwrap();
    writer.append(&record(2)).unwrap();

    assert_eq!(writer.get_stats().unwrap().total_files, 1);
}

#[test]
fn test_export_merges_and_restores_samples() {
    let source = tempdir().unwrap();
    let target_dir = tempdir().unwrap();
    let writer = DatasetWriter::from_path(source.path().to_path_buf())
        .unwrap()
        .with_max_file_size(4096);

    let samples: Samples = SequenceGenerator::with_seed(9).unwrap().generate(6).into();
    assert_eq!(write_samples(&writer, &samples).unwrap(), 6);

    let target = target_dir.path().join("merged.jsonl");
    let merged_files = to_jsonl(source.path(), &target).unwrap();
    assert_eq!(merged_files, writer.get_stats().unwrap().total_files);

    let restored = to_samples(read_jsonl(&target).unwrap()).unwrap();
    assert_eq!(restored, samples);
}

#[test]
fn test_export_missing_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(to_jsonl(&missing, &dir.path().join("out.jsonl")).is_err());
}

#[test]
fn test_stale_layout_records_are_skipped() {
    let dir = tempdir().unwrap();
    let writer = DatasetWriter::from_path(dir.path().to_path_buf()).unwrap();

    let mut stale = record(3);
    stale.layout_hash ^= 1;
    writer.append(&stale).unwrap();
    writer.append(&record(4)).unwrap();

    let path = dir.path().join(writer.get_stats().unwrap().current_file);
    assert_eq!(read_jsonl(&path).unwrap().len(), 1);
}

#[test]
fn test_class_distribution_matches_prior() {
    let mut generator = SequenceGenerator::with_seed(2024).unwrap();
    let (_, labels) = generator.generate(20_000);

    let mut counts = [0usize; RISK_CLASS_COUNT];
    for label in &labels {
        counts[label.class().index()] += 1;
    }

    for class in RiskClass::ALL {
        let observed = counts[class.index()] as f64 / labels.len() as f64;
        assert!(
            (observed - class.prior()).abs() < 0.02,
            "{}: observed {:.3}, prior {:.3}",
            class,
            observed,
            class.prior()
        );
    }
}

#[test]
fn test_training_profiles_reach_wider_healthy_band() {
    let mut generator =
        SequenceGenerator::with_profiles(training_profiles(), CLASS_PRIORS, StdRng::seed_from_u64(42)).unwrap();
    let (sequences, labels) = generator.generate(400);

    let healthy_days: Vec<_> = sequences
        .iter()
        .zip(labels.iter())
        .filter(|(_, label)| label.class() == RiskClass::Healthy)
        .flat_map(|(sequence, _)| sequence.iter().copied())
        .collect();
    assert!(!healthy_days.is_empty());

    let profile = &training_profiles()[RiskClass::Healthy.index()];
    assert!(healthy_days.iter().all(|day| profile.contains(day)));
    // The default band starts at 7 hours and 3 meetings
    assert!(healthy_days.iter().any(|day| day[IDX_HOURS_WORKED] < 7.0));
    assert!(healthy_days.iter().any(|day| day[IDX_MEETINGS_COUNT] == 2.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_generate_shapes(n in 0usize..40, seed in any::<u64>()) {
        let mut generator = SequenceGenerator::with_seed(seed).unwrap();
        let (sequences, labels) = generator.generate(n);

        prop_assert_eq!(sequences.len(), n);
        prop_assert_eq!(labels.len(), n);
        for (sequence, label) in sequences.iter().zip(labels.iter()) {
            prop_assert_eq!(sequence.len(), SEQUENCE_LENGTH);
            prop_assert!(sequence.iter().all(|day| day.len() == FEATURE_COUNT));
            prop_assert_eq!(label.0.iter().filter(|v| **v == 1.0).count(), 1);
            prop_assert_eq!(label.0.iter().filter(|v| **v == 0.0).count(), RISK_CLASS_COUNT - 1);
        }
    }

    #[test]
    fn prop_values_within_class_ranges(seed in any::<u64>()) {
        let mut generator = SequenceGenerator::with_seed(seed).unwrap();
        let (sequences, labels) = generator.generate(20);

        for (sequence, label) in sequences.iter().zip(labels.iter()) {
            let profile = generator.profile(label.class());
            for day in sequence.iter() {
                prop_assert!(profile.contains(day), "{:?} outside {} profile", day, label.class());
            }
        }
    }
}
