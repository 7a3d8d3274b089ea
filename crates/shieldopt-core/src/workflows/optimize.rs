//! End-to-end optimization run: configuration loading, feasibility gate,
//! warm start, the ask/tell loop with checkpointing and cooperative
//! interruption, and final reporting.

use crate::core::feasibility;
use crate::core::io::GeometryTemplate;
use crate::core::materials::{MaterialCatalog, MaterialsDatabase};
use crate::core::shield::Shield;
use crate::core::space::{RawPoint, SearchSpace};
use crate::engine::cancel::{CancelToken, InterruptWatcher};
use crate::engine::config::{OptimizerParams, RunConfig};
use crate::engine::error::EngineError;
use crate::engine::history::HistoryManager;
use crate::engine::objective::{ObjectiveOrchestrator, Outcome};
use crate::engine::optimizer::{AskTellOptimizer, LoopControl, OptimizeResult, RandomSearchOptimizer};
use crate::engine::simulator::ScriptSimulator;
use crate::engine::x0::X0Builder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::Cell;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// What one completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: OptimizeResult,
    pub evaluations: usize,
    pub elapsed: Duration,
    pub target_met: bool,
    pub interrupted: bool,
}

/// Runs one full optimization. Fatal configuration problems surface as
/// errors before the loop starts; per-iteration failures are absorbed into
/// penalty values inside the loop.
#[instrument(skip_all)]
pub fn run(config: &RunConfig, token: CancelToken) -> Result<RunReport, EngineError> {
    let started = Instant::now();
    info!("Shield optimization run - begin");

    let catalog = load_catalog(config)?;
    feasibility::check_bounds(&config.bounds, &catalog)?;

    let params = OptimizerParams::load(config.paths.optimizer_params_file.as_deref());
    feasibility::check_call_budget(config.n_calls, params.n_initial_points)?;

    let space = SearchSpace::build(config.bounds.clone(), &catalog, config.variant)?;
    info!(
        "Search space ready: {} dimensions for up to {} layers",
        space.dim(),
        config.bounds.max_layers
    );

    let template = GeometryTemplate::load(&config.paths.geometry_template)?;
    let simulator = ScriptSimulator::new(
        config.paths.simulator_cmd.clone(),
        template,
        config.paths.geometry_conf_dir.clone(),
        config.paths.sim_output_dir.clone(),
    );
    let evaluator = config.evaluator.build(
        config.paths.objective_params_file.as_deref(),
        config.bounds.max_shield_thickness,
        config.constraints.max_weight,
    );
    let mut orchestrator = ObjectiveOrchestrator::new(
        &space,
        &catalog,
        &config.constraints,
        config.targets,
        evaluator,
        Box::new(simulator),
        config.penalty_value,
        config.stiffness_correction,
    );

    let history = HistoryManager::new(config.paths.history_file.clone());
    let warm = history.load(config.history_slice.as_deref(), &space);
    let (warm_points, warm_values) = match warm {
        Some(warm) => (warm.points, warm.values),
        None => (Vec::new(), Vec::new()),
    };

    let x0 = build_x0(config, &space, &catalog, &params);
    let watcher = InterruptWatcher::new(token, config.paths.stop_file.clone());

    let target_met = Cell::new(false);
    let result = {
        let mut objective = |point: &RawPoint| {
            let evaluation = orchestrator.evaluate(point);
            if evaluation.outcome == Outcome::TargetMet {
                target_met.set(true);
            }
            evaluation.value
        };
        let mut callback = |result: &OptimizeResult| {
            if let Err(e) = history.save(result) {
                warn!("History checkpoint failed ({}): continuing", e);
            }
            if target_met.get() || watcher.should_stop() {
                LoopControl::Stop
            } else {
                LoopControl::Continue
            }
        };

        let mut optimizer = RandomSearchOptimizer::new(params.random_state);
        optimizer.minimize(
            &space,
            warm_points,
            warm_values,
            x0,
            config.n_calls,
            &mut objective,
            &mut callback,
        )
    };
    let evaluations = orchestrator.iterations();

    history.save(&result)?;
    let interrupted = watcher.should_stop() && !target_met.get();

    report_best(&space, &catalog, config, &result);
    let elapsed = started.elapsed();
    info!(
        "Shield optimization run - complete. Evaluations: {} (total on record: {}), target met: {}, interrupted: {}, elapsed: {:.1}s",
        evaluations,
        result.len(),
        target_met.get(),
        interrupted,
        elapsed.as_secs_f64()
    );

    Ok(RunReport {
        evaluations,
        elapsed,
        target_met: target_met.get(),
        interrupted,
        result,
    })
}

fn load_catalog(config: &RunConfig) -> Result<MaterialCatalog, EngineError> {
    let catalog = MaterialCatalog::load(&config.paths.materials_list, None)?;
    match &config.paths.materials_db {
        Some(db_path) => {
            let mut database = MaterialsDatabase::load(db_path)?;
            database.assert_contains(catalog.names())?;
            database.reduce_to(catalog.names());
            Ok(MaterialCatalog::from_names(
                catalog.names().to_vec(),
                Some(&database),
            ))
        }
        None => {
            info!("No materials database configured: weight/stiffness features disabled");
            Ok(catalog)
        }
    }
}

fn build_x0(
    config: &RunConfig,
    space: &SearchSpace,
    catalog: &MaterialCatalog,
    params: &OptimizerParams,
) -> Vec<RawPoint> {
    let builder = X0Builder::new(space, catalog);
    if let Some(path) = &config.paths.x0_file {
        if let Some(point) = builder.from_file(path) {
            return vec![point];
        }
        warn!("X0 file unusable: falling back");
    }
    if config.random_x0_count > 0 {
        let mut rng = match params.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        return builder.random(config.random_x0_count, &mut rng);
    }
    Vec::new()
}

fn report_best(
    space: &SearchSpace,
    catalog: &MaterialCatalog,
    config: &RunConfig,
    result: &OptimizeResult,
) {
    let Some(best_point) = &result.best_point else {
        warn!("No best solution on record");
        return;
    };
    match space.layers_data(best_point, catalog) {
        Ok((layers, _)) => {
            let shield = Shield::from_layers(layers, catalog, config.stiffness_correction);
            info!(
                "Best solution: [{}] | layers: {} | thickness: {:.4} | weight: {} | objective: {:?}",
                shield.layers_desc(),
                shield.num_layers(),
                shield.total_thickness(),
                shield
                    .total_weight()
                    .map_or("n.a.".to_string(), |w| format!("{w:.4}")),
                result.best_value
            );
        }
        Err(e) => warn!("Best solution could not be decoded ({})", e),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::constraints::ConstraintSet;
    use crate::core::kpi::KpiTargets;
    use crate::core::space::{ShieldBounds, SpaceVariant};
    use crate::engine::config::RunPaths;
    use crate::engine::score::EvaluatorKind;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    fn write_script(path: &Path, out: &Path) {
        let body = format!(
            "#!/bin/sh\nmkdir -p {out}/r$1\nprintf 'total_thickness;total_weight;energy_efficiency;protection_efficiency\\n5.0;42.0;0.9;0.8\\n' > {out}/r$1/glob_kpis_$1.csv\n",
            out = out.display()
        );
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn setup(dir: &TempDir) -> RunConfig {
        let root = dir.path();
        let out = root.join("out");
        fs::create_dir(&out).unwrap();

        fs::write(root.join("materials.txt"), "Al\nCu\nPb\n").unwrap();
        fs::write(
            root.join("template.json"),
            r#"{"layers": [{"name": "detector"}]}"#,
        )
        .unwrap();
        let script = root.join("simulate.sh");
        write_script(&script, &out);

        fs::write(
            root.join("opt_params.json"),
            r#"{"optimizerParams": {"n_initial_points": 1, "random_state": 7}}"#,
        )
        .unwrap();

        RunConfig {
            paths: RunPaths {
                materials_list: root.join("materials.txt"),
                materials_db: None,
                geometry_template: root.join("template.json"),
                geometry_conf_dir: root.to_path_buf(),
                sim_output_dir: out,
                simulator_cmd: script,
                history_file: Some(root.join("history.json")),
                x0_file: None,
                optimizer_params_file: Some(root.join("opt_params.json")),
                objective_params_file: None,
                stop_file: None,
            },
            bounds: ShieldBounds {
                min_layers: 1,
                max_layers: 2,
                min_layer_thickness: 0.5,
                max_layer_thickness: 10.0,
                min_shield_thickness: 0.5,
                max_shield_thickness: 20.0,
                max_shield_weight: 100.0,
            },
            variant: SpaceVariant::AdvTrimming,
            constraints: ConstraintSet {
                max_layer_thickness: 10.0,
                min_shield_thickness: 0.5,
                max_shield_thickness: 20.0,
                max_weight: 100.0,
                min_stiffness: 0.0,
                max_stiffness: f64::INFINITY,
                max_cost: f64::INFINITY,
            },
            targets: KpiTargets::default(),
            evaluator: EvaluatorKind::Base,
            penalty_value: 1e6,
            stiffness_correction: 1.0,
            n_calls: 3,
            history_slice: None,
            random_x0_count: 0,
        }
    }

    #[test]
    fn full_run_evaluates_and_checkpoints() {
        let dir = tempdir().unwrap();
        let config = setup(&dir);
        let report = run(&config, CancelToken::new()).unwrap();

        assert_eq!(report.evaluations, 3);
        assert_eq!(report.result.len(), 3);
        assert!(!report.target_met);
        assert!(!report.interrupted);
        // Every iteration passed the gates and scored -(0.9 + 0.8).
        assert_eq!(report.result.best_value, Some(-1.7));

        let history = fs::read_to_string(dir.path().join("history.json")).unwrap();
        let persisted: OptimizeResult = serde_json::from_str(&history).unwrap();
        assert_eq!(persisted.len(), 3);
    }

    #[test]
    fn persisted_history_warm_starts_the_next_run() {
        let dir = tempdir().unwrap();
        let config = setup(&dir);
        run(&config, CancelToken::new()).unwrap();
        let report = run(&config, CancelToken::new()).unwrap();

        // 3 replayed evaluations plus 3 fresh ones.
        assert_eq!(report.evaluations, 3);
        assert_eq!(report.result.len(), 6);
    }

    #[test]
    fn reaching_the_target_stops_early() {
        let dir = tempdir().unwrap();
        let mut config = setup(&dir);
        config.targets = KpiTargets {
            energy_efficiency: Some(0.5),
            protection_efficiency: Some(0.5),
        };
        let report = run(&config, CancelToken::new()).unwrap();
        assert!(report.target_met);
        assert_eq!(report.evaluations, 1);
    }

    #[test]
    fn cancelled_token_stops_after_one_iteration() {
        let dir = tempdir().unwrap();
        let config = setup(&dir);
        let token = CancelToken::new();
        token.cancel();
        let report = run(&config, token).unwrap();
        assert!(report.interrupted);
        assert_eq!(report.evaluations, 1);
    }

    #[test]
    fn infeasible_bounds_abort_before_the_loop() {
        let dir = tempdir().unwrap();
        let mut config = setup(&dir);
        config.bounds.min_layer_thickness = 5.0;
        config.bounds.max_shield_thickness = 3.0;
        config.bounds.min_shield_thickness = 0.0;
        assert!(matches!(
            run(&config, CancelToken::new()),
            Err(EngineError::Feasibility(_))
        ));
    }

    #[test]
    fn call_budget_below_initial_points_aborts() {
        let dir = tempdir().unwrap();
        let mut config = setup(&dir);
        fs::write(
            config.paths.optimizer_params_file.as_ref().unwrap(),
            r#"{"optimizerParams": {"n_initial_points": 10}}"#,
        )
        .unwrap();
        assert!(matches!(
            run(&config, CancelToken::new()),
            Err(EngineError::Feasibility(_))
        ));
    }
}
