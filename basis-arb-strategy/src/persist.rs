//! Positions/P&L persistence across runs.
//!
//! A single CSV row: one signed decimal per venue in config order, then the
//! cumulative P&L. Absence of the file is a clean first run; an unreadable or
//! malformed file is fatal at startup.

use crate::error::EngineError;
use std::path::Path;

/// State recovered from a previous run.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    /// Per-venue positions in config order.
    pub positions: Vec<f64>,
    pub pl: f64,
}

/// Load persisted state. `Ok(None)` when no file exists yet.
pub fn load(path: &Path, venue_count: usize) -> Result<Option<PersistedState>, EngineError> {
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| EngineError::Persistence(e.to_string()))?;

    let record = match reader.records().next() {
        Some(record) => record.map_err(|e| EngineError::Persistence(e.to_string()))?,
        None => return Ok(None),
    };
    if record.len() != venue_count + 1 {
        return Err(EngineError::Persistence(format!(
            "expected {} fields, found {}",
            venue_count + 1,
            record.len()
        )));
    }

    let mut values = Vec::with_capacity(record.len());
    for field in record.iter() {
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|_| EngineError::Persistence(format!("bad field {field:?}")))?;
        values.push(value);
    }
    let pl = values.pop().expect("record is non-empty");

    Ok(Some(PersistedState {
        positions: values,
        pl,
    }))
}

/// Overwrite the store with current positions and P&L.
pub fn save(path: &Path, positions: &[f64], pl: f64) -> Result<(), EngineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| EngineError::Persistence(e.to_string()))?;

    let row: Vec<String> = positions
        .iter()
        .chain(std::iter::once(&pl))
        .map(|value| format!("{value:.6}"))
        .collect();
    writer
        .write_record(&row)
        .map_err(|e| EngineError::Persistence(e.to_string()))?;
    writer
        .flush()
        .map_err(|e| EngineError::Persistence(e.to_string()))?;
    Ok(())
}
