use crate::core::constraints::ConstraintSet;
use crate::core::kpi::KpiTargets;
use crate::core::space::{ShieldBounds, SpaceVariant};
use crate::engine::score::EvaluatorKind;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Filesystem locations of every artifact one run touches.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub materials_list: PathBuf,
    pub materials_db: Option<PathBuf>,
    pub geometry_template: PathBuf,
    pub geometry_conf_dir: PathBuf,
    pub sim_output_dir: PathBuf,
    pub simulator_cmd: PathBuf,
    pub history_file: Option<PathBuf>,
    pub x0_file: Option<PathBuf>,
    pub optimizer_params_file: Option<PathBuf>,
    pub objective_params_file: Option<PathBuf>,
    pub stop_file: Option<PathBuf>,
}

/// Full configuration of one optimization run, assembled by the caller
/// (typically the CLI) before the workflow starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub paths: RunPaths,
    pub bounds: ShieldBounds,
    pub variant: SpaceVariant,
    pub constraints: ConstraintSet,
    pub targets: KpiTargets,
    pub evaluator: EvaluatorKind,
    /// Sentinel objective value returned for every failed iteration.
    pub penalty_value: f64,
    pub stiffness_correction: f64,
    /// Fresh evaluation budget; replayed warm-start points do not count
    /// against it.
    pub n_calls: usize,
    /// History slice directive, e.g. "10:50", "10:", ":50", "_:50".
    pub history_slice: Option<String>,
    /// Number of random initial points synthesized when no X0 file applies;
    /// zero leaves warm-up to the optimizer itself.
    pub random_x0_count: usize,
}

const OPTIMIZER_PARAM_KEYS: &[&str] = &[
    "n_initial_points",
    "initial_point_generator",
    "acq_func",
    "acq_optimizer",
    "random_state",
    "n_points",
    "n_restarts_optimizer",
    "kappa",
    "xi",
    "noise",
    "n_jobs",
    "model_queue_size",
];

/// Numeric knobs of the black-box optimizer, loaded from the
/// `{"optimizerParams": {...}}` JSON file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    pub n_initial_points: usize,
    pub initial_point_generator: String,
    pub acq_func: String,
    pub acq_optimizer: String,
    pub random_state: Option<u64>,
    pub n_points: usize,
    pub n_restarts_optimizer: usize,
    pub kappa: f64,
    pub xi: f64,
    pub noise: String,
    pub n_jobs: i32,
    pub model_queue_size: Option<usize>,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            n_initial_points: 200,
            initial_point_generator: "random".to_string(),
            acq_func: "gp_hedge".to_string(),
            acq_optimizer: "lbfgs".to_string(),
            random_state: None,
            n_points: 10_000,
            n_restarts_optimizer: 5,
            kappa: 1.96,
            xi: 0.01,
            noise: "gaussian".to_string(),
            n_jobs: 1,
            model_queue_size: None,
        }
    }
}

impl OptimizerParams {
    /// Loads the optimizer parameters file. Any problem (absent path,
    /// unreadable file, malformed JSON, missing top-level key) falls back to
    /// the full default set; unrecognized keys are warned and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No optimizer parameters file configured: using defaults");
            return Self::default();
        };

        let section = match Self::read_section(path) {
            Ok(section) => section,
            Err(reason) => {
                warn!(
                    "Optimizer parameters file '{}' unusable ({}): falling back to defaults",
                    path.display(),
                    reason
                );
                return Self::default();
            }
        };

        if let Some(object) = section.as_object() {
            for key in object.keys() {
                if !OPTIMIZER_PARAM_KEYS.contains(&key.as_str()) {
                    warn!(
                        "Unknown optimizer parameter '{}' in '{}' ignored",
                        key,
                        path.display()
                    );
                }
            }
        }

        match serde_json::from_value::<OptimizerParams>(section) {
            Ok(params) => {
                info!(
                    "Optimizer parameters loaded from '{}': {:?}",
                    path.display(),
                    params
                );
                params
            }
            Err(e) => {
                warn!(
                    "Optimizer parameters file '{}' has invalid values ({}): falling back to defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    fn read_section(path: &Path) -> Result<Value, String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let value: Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        value
            .get("optimizerParams")
            .cloned()
            .ok_or_else(|| "missing 'optimizerParams' object".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn absent_path_yields_defaults() {
        let params = OptimizerParams::load(None);
        assert_eq!(params, OptimizerParams::default());
        assert_eq!(params.n_initial_points, 200);
        assert_eq!(params.acq_func, "gp_hedge");
        assert_eq!(params.kappa, 1.96);
    }

    #[test]
    fn unreadable_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert_eq!(
            OptimizerParams::load(Some(&path)),
            OptimizerParams::default()
        );
    }

    #[test]
    fn malformed_json_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(
            OptimizerParams::load(Some(&path)),
            OptimizerParams::default()
        );
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(
            &path,
            r#"{"optimizerParams": {"n_initial_points": 10, "random_state": 42}}"#,
        )
        .unwrap();
        let params = OptimizerParams::load(Some(&path));
        assert_eq!(params.n_initial_points, 10);
        assert_eq!(params.random_state, Some(42));
        assert_eq!(params.acq_func, "gp_hedge");
        assert_eq!(params.n_points, 10_000);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(
            &path,
            r#"{"optimizerParams": {"n_jobs": 4, "warp_drive": true}}"#,
        )
        .unwrap();
        let params = OptimizerParams::load(Some(&path));
        assert_eq!(params.n_jobs, 4);
    }

    #[test]
    fn wrong_value_type_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{"optimizerParams": {"kappa": "high"}}"#).unwrap();
        assert_eq!(
            OptimizerParams::load(Some(&path)),
            OptimizerParams::default()
        );
    }
}
