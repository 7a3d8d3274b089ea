use crate::core::space::{RawPoint, SearchSpace};
use crate::engine::optimizer::OptimizeResult;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Prior evaluations replayed into the optimizer before new asks.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmStart {
    pub points: Vec<RawPoint>,
    pub values: Vec<f64>,
}

/// Loads and persists the optimizer result across process restarts.
///
/// Loading is best effort: a missing or corrupt file means a fresh start,
/// never an abort. Saving overwrites the previous file atomically via a
/// sibling temp file and rename.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    path: Option<PathBuf>,
}

impl HistoryManager {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Loads the persisted history, restricted by the slice directive and
    /// validated against the search space. Points failing validation are
    /// dropped individually; their values go with them, so the two arrays
    /// never desynchronize.
    pub fn load(&self, slice: Option<&str>, space: &SearchSpace) -> Option<WarmStart> {
        let path = self.path.as_ref()?;
        if !path.exists() {
            info!(
                "No history file at '{}': starting from scratch",
                path.display()
            );
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Could not read history file '{}' ({}): starting from scratch",
                    path.display(),
                    e
                );
                return None;
            }
        };
        let record: OptimizeResult = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "History file '{}' is not a valid result record ({}): starting from scratch",
                    path.display(),
                    e
                );
                return None;
            }
        };

        let mut points = record.points;
        let mut values = record.values;
        if points.len() != values.len() {
            let kept = points.len().min(values.len());
            warn!(
                "History file '{}' has {} points but {} values: truncating both to {}",
                path.display(),
                points.len(),
                values.len(),
                kept
            );
            points.truncate(kept);
            values.truncate(kept);
        }

        let range = slice_range(points.len(), slice);
        let sliced_points = points[range.clone()].to_vec();
        let sliced_values = values[range.clone()].to_vec();
        info!(
            "History loaded from '{}': {} evaluations on file, {} selected ({:?})",
            path.display(),
            points.len(),
            sliced_points.len(),
            range
        );

        let mut kept_points = Vec::with_capacity(sliced_points.len());
        let mut kept_values = Vec::with_capacity(sliced_values.len());
        for (i, (point, value)) in sliced_points.into_iter().zip(sliced_values).enumerate() {
            let errors = space.check_point(&point);
            if errors.is_empty() {
                kept_points.push(point);
                kept_values.push(value);
            } else {
                warn!(
                    "History point #{} dropped ({} problem(s)): {}",
                    i,
                    errors.len(),
                    errors.join("; ")
                );
            }
        }
        debug_assert_eq!(kept_points.len(), kept_values.len());

        if kept_points.is_empty() {
            warn!("No usable history points survived validation: starting from scratch");
            return None;
        }
        info!(
            "Warm start ready: {} prior evaluations",
            kept_points.len()
        );
        Some(WarmStart {
            points: kept_points,
            values: kept_values,
        })
    }

    /// Persists the full result, replacing the previous history file.
    pub fn save(&self, result: &OptimizeResult) -> Result<(), HistoryError> {
        let Some(path) = self.path.as_ref() else {
            debug!("No history file configured: result not persisted");
            return Ok(());
        };

        let content = serde_json::to_string(result).map_err(|e| HistoryError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|e| HistoryError::Io {
            path: tmp.to_string_lossy().to_string(),
            source: e,
        })?;
        std::fs::rename(&tmp, path).map_err(|e| HistoryError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        info!(
            "History checkpoint written: {} ({} evaluations)",
            path.display(),
            result.points.len()
        );
        Ok(())
    }
}

/// Resolves a slice directive against a history of `len` evaluations.
///
/// Supported forms: `a:b` (b entries starting at a), `a:` (from a to the
/// end), `:b` (first b), `_:b` (last b). Anything else selects the whole
/// history with a warning.
fn slice_range(len: usize, selector: Option<&str>) -> Range<usize> {
    let Some(selector) = selector else {
        return 0..len;
    };
    let full = || {
        warn!(
            "Malformed history slice directive '{}': using the full history",
            selector
        );
        0..len
    };

    let Some((from, count)) = selector.split_once(':') else {
        return full();
    };
    let from = from.trim();
    let count = count.trim();

    if from == "_" {
        return match count.parse::<usize>() {
            Ok(n) => len.saturating_sub(n)..len,
            Err(_) => full(),
        };
    }

    let start = if from.is_empty() {
        0
    } else {
        match from.parse::<usize>() {
            Ok(a) => a.min(len),
            Err(_) => return full(),
        }
    };
    let end = if count.is_empty() {
        len
    } else {
        match count.parse::<usize>() {
            Ok(n) => start.saturating_add(n).min(len),
            Err(_) => return full(),
        }
    };
    start..end
}
