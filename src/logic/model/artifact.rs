//! JSON artifact files (model, scaler, history)

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PredictorResult;

/// Write `value` as pretty JSON, creating parent directories.
///
/// The file is written beside the target and renamed into place, so a
/// reader never observes a half-written artifact.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PredictorResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> PredictorResult<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
