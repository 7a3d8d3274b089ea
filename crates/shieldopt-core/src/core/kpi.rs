use crate::core::metadata::KPI_FILE_DELIM;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("KPI file '{path}' contains no data row")]
    MissingRow { path: String },
}

/// Simulator-reported performance indicators for one run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct KpiReport {
    pub total_thickness: f64,
    pub total_weight: f64,
    pub energy_efficiency: f64,
    pub protection_efficiency: f64,
}

impl KpiReport {
    /// Reads the delimited KPI file produced by the simulator: a header row
    /// followed by exactly one data row. Extra rows are tolerated with a
    /// warning; the first data row wins.
    pub fn load(path: &Path) -> Result<Self, KpiError> {
        debug!("Loading KPI file: {}", path.display());
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(KPI_FILE_DELIM)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| KpiError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut rows = reader.deserialize::<KpiReport>();
        let report = rows
            .next()
            .transpose()
            .map_err(|e| KpiError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?
            .ok_or_else(|| KpiError::MissingRow {
                path: path.to_string_lossy().to_string(),
            })?;

        let extra = rows.count();
        if extra > 0 {
            warn!(
                "KPI file '{}' has {} extra data row(s): keeping the first",
                path.display(),
                extra
            );
        }

        info!(
            "KPIs loaded. Thickness: {}, weight: {}, EE: {}, PE: {}",
            report.total_thickness,
            report.total_weight,
            report.energy_efficiency,
            report.protection_efficiency
        );
        Ok(report)
    }
}

/// Performance targets that end the optimization early once reached.
/// An unset target is never considered; with no targets set the run always
/// goes the full distance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KpiTargets {
    pub energy_efficiency: Option<f64>,
    pub protection_efficiency: Option<f64>,
}

impl KpiTargets {
    pub fn any_set(&self) -> bool {
        self.energy_efficiency.is_some() || self.protection_efficiency.is_some()
    }

    /// True when every configured target is reached.
    pub fn is_met(&self, report: &KpiReport) -> bool {
        if !self.any_set() {
            return false;
        }
        let ee_ok = self
            .energy_efficiency
            .is_none_or(|t| report.energy_efficiency >= t);
        let pe_ok = self
            .protection_efficiency
            .is_none_or(|t| report.protection_efficiency >= t);
        ee_ok && pe_ok
    }
}
