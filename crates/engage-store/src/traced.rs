//! Traced-data loading from line-delimited JSON.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use engage_core::TracedRecord;
use tracing::info;

use crate::StoreError;

/// Read every record in one JSONL file, in line order. Blank lines are skipped.
pub fn load_traced_data_file(path: &Path) -> Result<Vec<TracedRecord>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    info!(path = %path.display(), "loading traced data");
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        records.push(record);
    }
    info!(count = records.len(), "loaded traced data objects");
    Ok(records)
}

/// Load several files, concatenated in argument order.
pub fn load_traced_data<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<TracedRecord>, StoreError> {
    let mut records = Vec::new();
    for path in paths {
        records.extend(load_traced_data_file(path.as_ref())?);
    }
    Ok(records)
}
