use crate::core::io::{GeometryError, GeometryTemplate};
use crate::core::kpi::{KpiError, KpiReport};
use crate::core::metadata;
use crate::core::shield::Shield;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Could not launch simulator '{command}': {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    #[error("Simulator '{command}' exited with status {status} (run {run_id})")]
    Failed {
        command: String,
        status: String,
        run_id: String,
    },

    #[error("Geometry generation failed: {0}")]
    Geometry(#[from] GeometryError),

    #[error("KPI retrieval failed: {0}")]
    Kpi(#[from] KpiError),
}

/// Seam to the external physical simulation. One call per candidate shield;
/// blocking, no timeout, so a hanging simulator stalls the run.
pub trait Simulator {
    /// Runs one simulation and returns the run id together with the KPIs it
    /// reported.
    fn run(&self, shield: &Shield) -> Result<(String, KpiReport), SimulationError>;
}

/// Drives the external simulator script: writes the per-run geometry file,
/// invokes the script with the run id as its single argument, and reads the
/// KPI file back from the run's output directory.
pub struct ScriptSimulator {
    command: PathBuf,
    template: GeometryTemplate,
    geometry_conf_dir: PathBuf,
    output_dir: PathBuf,
}

impl ScriptSimulator {
    pub fn new(
        command: PathBuf,
        template: GeometryTemplate,
        geometry_conf_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            command,
            template,
            geometry_conf_dir,
            output_dir,
        }
    }
}

impl Simulator for ScriptSimulator {
    fn run(&self, shield: &Shield) -> Result<(String, KpiReport), SimulationError> {
        let run_id = metadata::create_run_id();
        let geometry_path = metadata::geometry_conf_path(&self.geometry_conf_dir, &run_id);
        self.template.write(&geometry_path, shield)?;

        info!(
            "Launching simulation run {} ({})",
            run_id,
            self.command.display()
        );
        let status = Command::new(&self.command)
            .arg(&run_id)
            .status()
            .map_err(|e| SimulationError::Launch {
                command: self.command.to_string_lossy().to_string(),
                source: e,
            })?;
        if !status.success() {
            warn!("Simulation run {} failed: {}", run_id, status);
            return Err(SimulationError::Failed {
                command: self.command.to_string_lossy().to_string(),
                status: status.to_string(),
                run_id,
            });
        }
        debug!("Simulation run {} completed", run_id);

        let kpi_path = metadata::kpi_file_path(&self.output_dir, &run_id);
        let report = KpiReport::load(&kpi_path)?;
        Ok((run_id, report))
    }
}
