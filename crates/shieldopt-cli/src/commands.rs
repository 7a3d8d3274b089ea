use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use shieldopt::core::kpi::KpiTargets;
use shieldopt::core::metadata;
use shieldopt::core::space::ShieldBounds;
use shieldopt::core::constraints::ConstraintSet;
use shieldopt::engine::cancel::CancelToken;
use shieldopt::engine::config::{RunConfig, RunPaths};
use shieldopt::workflows;
use tracing::info;

pub fn run(args: RunArgs, token: CancelToken) -> Result<()> {
    let config = build_config(args)?;
    let report = workflows::run(&config, token)?;

    info!(
        "Run finished: {} evaluation(s) in {:.1}s",
        report.evaluations,
        report.elapsed.as_secs_f64()
    );
    if report.target_met {
        info!("Performance targets reached: early success");
    }
    if report.interrupted {
        info!("Run was interrupted; history checkpoint allows resumption");
    }
    Ok(())
}

pub fn build_config(args: RunArgs) -> Result<RunConfig> {
    if !args.sim_output_dir.is_dir() {
        return Err(CliError::Argument(format!(
            "simulator output directory '{}' does not exist",
            args.sim_output_dir.display()
        )));
    }
    if !args.geometry_conf_dir.is_dir() {
        return Err(CliError::Argument(format!(
            "geometry configuration directory '{}' does not exist",
            args.geometry_conf_dir.display()
        )));
    }

    // Without an explicit stop file, derive one next to the simulator
    // output so each invocation gets a fresh marker name.
    let stop_file = args.stop_file.clone().unwrap_or_else(|| {
        args.sim_output_dir
            .join(format!("stop_{}", metadata::create_run_id()))
    });

    Ok(RunConfig {
        paths: RunPaths {
            materials_list: args.materials,
            materials_db: args.materials_db,
            geometry_template: args.geometry_template,
            geometry_conf_dir: args.geometry_conf_dir,
            sim_output_dir: args.sim_output_dir,
            simulator_cmd: args.simulator,
            history_file: args.history_file,
            x0_file: args.x0_file,
            optimizer_params_file: args.optimizer_params,
            objective_params_file: args.objective_params,
            stop_file: Some(stop_file),
        },
        bounds: ShieldBounds {
            min_layers: args.min_layers,
            max_layers: args.max_layers,
            min_layer_thickness: args.min_layer_thickness,
            max_layer_thickness: args.max_layer_thickness,
            min_shield_thickness: args.min_shield_thickness,
            max_shield_thickness: args.max_shield_thickness,
            max_shield_weight: args.max_shield_weight,
        },
        variant: args.space.into(),
        constraints: ConstraintSet {
            max_layer_thickness: args.max_layer_thickness,
            min_shield_thickness: args.min_shield_thickness,
            max_shield_thickness: args.max_shield_thickness,
            max_weight: args.max_shield_weight,
            min_stiffness: args.min_stiffness,
            max_stiffness: args.max_stiffness,
            max_cost: args.max_cost,
        },
        targets: KpiTargets {
            energy_efficiency: args.target_ee,
            protection_efficiency: args.target_pe,
        },
        evaluator: args.evaluator.into(),
        penalty_value: args.penalty,
        stiffness_correction: args.stiffness_correction,
        n_calls: args.n_calls,
        history_slice: args.history_slice,
        random_x0_count: args.random_x0,
    })
}
