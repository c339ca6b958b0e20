use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::logic::dataset::record::DatasetRecord;
use crate::logic::dataset::split::Samples;
use crate::logic::dataset::writer::list_jsonl;
use crate::logic::features::Sequence;

/// Merge every `.jsonl` file of `source_dir` into `target_path`, in
/// chronological order. Returns the number of source files merged.
pub fn to_jsonl(source_dir: &Path, target_path: &Path) -> io::Result<usize> {
    if !source_dir.exists() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "Dataset directory not found"));
    }

    let paths = list_jsonl(source_dir)?;
    // Create after listing so a target inside the source is not merged into itself
    let mut output_file = File::create(target_path)?;
    let mut file_count = 0;

    for path in paths {
        let content = fs::read(&path)?;
        output_file.write_all(&content)?;

        if let Some(&last_byte) = content.last() {
            if last_byte != b'\n' {
                output_file.write_all(b"\n")?;
            }
        }

        file_count += 1;
    }

    output_file.flush()?;
    log::info!("Exported {} dataset files to {}", file_count, target_path.display());
    Ok(file_count)
}

/// Read records back from one JSONL file.
///
/// Records written under a different feature layout are skipped with a
/// warning; malformed lines fail the read.
pub fn read_jsonl(path: &Path) -> io::Result<Vec<DatasetRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut skipped = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DatasetRecord = serde_json::from_str(&line)?;
        if record.is_current_layout() {
            records.push(record);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} records with a stale feature layout in {}", skipped, path.display());
    }
    Ok(records)
}

/// Turn records back into training samples
pub fn to_samples(records: Vec<DatasetRecord>) -> io::Result<Samples> {
    let mut samples = Samples::default();
    for record in records {
        let sequence = Sequence::new(record.days)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        samples.sequences.push(sequence);
        samples.labels.push(record.label);
    }
    Ok(samples)
}
