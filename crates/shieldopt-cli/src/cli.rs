use clap::{Args, Parser, Subcommand, ValueEnum};
use shieldopt::core::space::SpaceVariant;
use shieldopt::engine::score::EvaluatorKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "shieldopt - black-box optimization of multi-layer radiation shields against an external physics simulator.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the shield optimization loop against the configured simulator.
    Run(RunArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpaceVariantArg {
    /// Materials by name, no candidate repair.
    Base,
    /// Materials by index, thickness/weight trimming.
    AdvTrimming,
    /// Trimming plus the no-adjacent-duplicate rotation encoding.
    AdvRotation,
}

impl From<SpaceVariantArg> for SpaceVariant {
    fn from(arg: SpaceVariantArg) -> Self {
        match arg {
            SpaceVariantArg::Base => SpaceVariant::Base,
            SpaceVariantArg::AdvTrimming => SpaceVariant::AdvTrimming,
            SpaceVariantArg::AdvRotation => SpaceVariant::AdvRotation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EvaluatorArg {
    /// Negated sum of the efficiency KPIs.
    Base,
    /// Log-compressed weighted objective with size/weight pressure.
    WeightedLog,
}

impl From<EvaluatorArg> for EvaluatorKind {
    fn from(arg: EvaluatorArg) -> Self {
        match arg {
            EvaluatorArg::Base => EvaluatorKind::Base,
            EvaluatorArg::WeightedLog => EvaluatorKind::WeightedLog,
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Static inputs ---
    /// Newline-delimited list of material names in scope.
    #[arg(long, required = true, value_name = "PATH")]
    pub materials: PathBuf,

    /// Materials physical-properties database (JSON). Without it,
    /// weight- and stiffness-aware features are disabled.
    #[arg(long, value_name = "PATH")]
    pub materials_db: Option<PathBuf>,

    /// Geometry template document the shield layers are spliced into.
    #[arg(long, required = true, value_name = "PATH")]
    pub geometry_template: PathBuf,

    /// Directory receiving the per-run geometry configuration files.
    #[arg(long, required = true, value_name = "DIR")]
    pub geometry_conf_dir: PathBuf,

    // --- Simulator ---
    /// Simulator executable, invoked once per candidate with the run id.
    #[arg(long, required = true, value_name = "PATH")]
    pub simulator: PathBuf,

    /// Simulator output root; KPIs are read from <DIR>/r<run_id>/.
    #[arg(long, required = true, value_name = "DIR")]
    pub sim_output_dir: PathBuf,

    // --- Shield bounds ---
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub min_layers: usize,

    #[arg(long, default_value_t = 5, value_name = "N")]
    pub max_layers: usize,

    #[arg(long, default_value_t = 0.5, value_name = "MM")]
    pub min_layer_thickness: f64,

    #[arg(long, default_value_t = 20.0, value_name = "MM")]
    pub max_layer_thickness: f64,

    #[arg(long, default_value_t = 0.5, value_name = "MM")]
    pub min_shield_thickness: f64,

    #[arg(long, default_value_t = 50.0, value_name = "MM")]
    pub max_shield_thickness: f64,

    /// Maximum shield surface weight, used by trimming and the constraint
    /// gates.
    #[arg(long, default_value_t = 500.0, value_name = "KG_M2")]
    pub max_shield_weight: f64,

    // --- Constraints beyond the bounds ---
    /// Advisory stiffness range lower end (warn only).
    #[arg(long, default_value_t = 0.0, value_name = "GPA")]
    pub min_stiffness: f64,

    /// Advisory stiffness range upper end (warn only).
    #[arg(long, default_value_t = f64::INFINITY, value_name = "GPA")]
    pub max_stiffness: f64,

    /// Maximum total cost of ownership.
    #[arg(long, default_value_t = f64::INFINITY, value_name = "COST")]
    pub max_cost: f64,

    /// Stiffness correction factor applied when aggregating layer moduli.
    #[arg(long, default_value_t = 1.0, value_name = "FACTOR")]
    pub stiffness_correction: f64,

    // --- Search strategy ---
    /// Search space builder variant.
    #[arg(long, value_enum, default_value_t = SpaceVariantArg::AdvRotation)]
    pub space: SpaceVariantArg,

    /// Objective evaluator.
    #[arg(long, value_enum, default_value_t = EvaluatorArg::Base)]
    pub evaluator: EvaluatorArg,

    /// Objective value assigned to every failed iteration.
    #[arg(long, default_value_t = 1e6, value_name = "VALUE")]
    pub penalty: f64,

    /// Total evaluation budget of the run.
    #[arg(long, default_value_t = 250, value_name = "N")]
    pub n_calls: usize,

    /// Optimizer numeric parameters file ({"optimizerParams": ...}).
    #[arg(long, value_name = "PATH")]
    pub optimizer_params: Option<PathBuf>,

    /// Objective evaluator parameters file ({"objFunParams": ...}).
    #[arg(long, value_name = "PATH")]
    pub objective_params: Option<PathBuf>,

    // --- Targets ---
    /// Energy-efficiency target; reaching all set targets stops the run.
    #[arg(long, value_name = "VALUE")]
    pub target_ee: Option<f64>,

    /// Protection-efficiency target.
    #[arg(long, value_name = "VALUE")]
    pub target_pe: Option<f64>,

    // --- Resumption and warm start ---
    /// History checkpoint file; presence triggers warm-started resumption.
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Slice of the prior history to reuse: "a:b", "a:", ":b" or "_:b".
    #[arg(long, value_name = "SLICE")]
    pub history_slice: Option<String>,

    /// Initial shield description file ({"shield": {"layers": ...}}).
    #[arg(long, value_name = "PATH")]
    pub x0_file: Option<PathBuf>,

    /// Number of random initial points synthesized when no X0 file applies.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub random_x0: usize,

    // --- Interruption ---
    /// Marker file whose appearance interrupts the run at the next
    /// iteration boundary. Defaults to stop_<timestamp> in the simulator
    /// output directory.
    #[arg(long, value_name = "PATH")]
    pub stop_file: Option<PathBuf>,
}
