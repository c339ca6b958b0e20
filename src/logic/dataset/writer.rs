use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use crate::logic::dataset::record::DatasetRecord;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// Summary of the files in a dataset directory
#[derive(Debug, Clone, PartialEq)]
pub struct WriterStats {
    pub total_files: usize,
    pub total_size_mb: f32,
    pub current_file: String,
}

pub struct DatasetWriter {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
    max_file_size: u64,
}

impl DatasetWriter {
    pub fn new() -> io::Result<Self> {
        Self::from_path(super::get_dataset_dir())
    }

    pub fn from_path(base_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;

        Ok(Self {
            file: Mutex::new(None),
            base_dir,
            max_file_size: MAX_FILE_SIZE,
        })
    }

    /// Rotate at `bytes` instead of 10 MB
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes.max(1);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Append one record as a JSON line, rotating when the current file
    /// reaches the size limit
    pub fn append(&self, record: &DatasetRecord) -> io::Result<()> {
        let mut file_guard = self.file.lock();

        // Resume the newest file if it still has room
        if file_guard.is_none() {
            let reusable = match self.find_latest_log_file()? {
                Some(path) => {
                    let f = OpenOptions::new().create(true).append(true).open(&path)?;
                    if f.metadata()?.len() < self.max_file_size {
                        Some(f)
                    } else {
                        None
                    }
                }
                None => None,
            };
            *file_guard = Some(match reusable {
                Some(f) => f,
                None => self.create_new_file()?,
            });
        }

        let should_rotate = match file_guard.as_ref() {
            Some(f) => f.metadata()?.len() >= self.max_file_size,
            None => false,
        };
        if should_rotate {
            *file_guard = Some(self.create_new_file()?);
        }

        if let Some(file) = file_guard.as_mut() {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{}", json)?;
        }

        Ok(())
    }

    /// Append many records; returns how many were written
    pub fn append_all<'a>(&self, records: impl IntoIterator<Item = &'a DatasetRecord>) -> io::Result<usize> {
        let mut written = 0;
        for record in records {
            self.append(record)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn get_stats(&self) -> io::Result<WriterStats> {
        let paths = list_jsonl(&self.base_dir)?;

        let mut size = 0u64;
        for path in &paths {
            if let Ok(meta) = fs::metadata(path) {
                size += meta.len();
            }
        }

        let current_file = paths
            .last()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("None")
            .to_string();

        Ok(WriterStats {
            total_files: paths.len(),
            total_size_mb: size as f32 / 1024.0 / 1024.0,
            current_file,
        })
    }

    fn create_new_file(&self) -> io::Result<File> {
        let now = Utc::now();
        // dataset-YYYY-MM-DD-HHMMSS-NNNN.jsonl; the counter keeps rotations
        // within one second apart and in order
        let sequence = list_jsonl(&self.base_dir)?.len();
        let filename = format!("dataset-{}-{:04}.jsonl", now.format("%Y-%m-%d-%H%M%S"), sequence);
        let path = self.base_dir.join(filename);

        log::debug!("Opening dataset file {}", path.display());
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn find_latest_log_file(&self) -> io::Result<Option<PathBuf>> {
        Ok(list_jsonl(&self.base_dir)?.pop())
    }
}

/// `.jsonl` files in `dir`, sorted by name (chronological)
pub(crate) fn list_jsonl(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
        .collect();
    paths.sort();
    Ok(paths)
}
