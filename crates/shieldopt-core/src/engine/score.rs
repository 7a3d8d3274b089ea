use crate::core::kpi::KpiReport;
use crate::core::shield::Shield;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// Maps one completed, constraint-passing evaluation to the scalar the
/// optimizer minimizes. Lower is better.
pub trait ObjectiveEvaluator {
    fn evaluate(&self, shield: &Shield, kpis: &KpiReport) -> f64;
}

/// The closed set of objective evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluatorKind {
    /// Negated sum of the two efficiency KPIs.
    #[default]
    Base,
    /// Log-compressed weighted reward with linear thickness/weight pressure
    /// and hard overshoot penalties.
    WeightedLog,
}

impl EvaluatorKind {
    /// Builds the evaluator, reading the `{"objFunParams": {...}}` file when
    /// the kind uses one. `max_thickness`/`max_weight` anchor the weighted
    /// evaluator's normalization and overshoot thresholds.
    pub fn build(
        self,
        params_path: Option<&Path>,
        max_thickness: f64,
        max_weight: f64,
    ) -> Box<dyn ObjectiveEvaluator> {
        match self {
            EvaluatorKind::Base => {
                info!("Objective evaluator: base (negated KPI sum)");
                Box::new(BaseEvaluator)
            }
            EvaluatorKind::WeightedLog => {
                let params = WeightedLogParams::load(params_path);
                info!("Objective evaluator: weighted log ({:?})", params);
                Box::new(WeightedLogEvaluator {
                    params,
                    max_thickness,
                    max_weight,
                })
            }
        }
    }
}

/// `-(EE + PE)`: pure KPI maximization, no size pressure.
pub struct BaseEvaluator;

impl ObjectiveEvaluator for BaseEvaluator {
    fn evaluate(&self, _shield: &Shield, kpis: &KpiReport) -> f64 {
        -(kpis.energy_efficiency + kpis.protection_efficiency)
    }
}

const OBJ_FUN_PARAM_KEYS: &[&str] = &[
    "w_EE",
    "w_PE",
    "lambda_T",
    "lambda_W",
    "alpha_T",
    "alpha_W",
    "epsilon",
    "hp_exponent",
];

/// Weights of the weighted-log objective, loaded from the
/// `{"objFunParams": {...}}` JSON file. Missing keys default; a broken file
/// falls back entirely to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeightedLogParams {
    #[serde(rename = "w_EE")]
    pub w_ee: f64,
    #[serde(rename = "w_PE")]
    pub w_pe: f64,
    #[serde(rename = "lambda_T")]
    pub lambda_t: f64,
    #[serde(rename = "lambda_W")]
    pub lambda_w: f64,
    #[serde(rename = "alpha_T")]
    pub alpha_t: f64,
    #[serde(rename = "alpha_W")]
    pub alpha_w: f64,
    pub epsilon: f64,
    pub hp_exponent: f64,
}

impl Default for WeightedLogParams {
    fn default() -> Self {
        Self {
            w_ee: 1.0,
            w_pe: 1.0,
            lambda_t: 0.1,
            lambda_w: 0.1,
            alpha_t: 10.0,
            alpha_w: 10.0,
            epsilon: 1e-9,
            hp_exponent: 2.0,
        }
    }
}

impl WeightedLogParams {
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No objective parameters file configured: using defaults");
            return Self::default();
        };

        let section = match read_section(path) {
            Ok(section) => section,
            Err(reason) => {
                warn!(
                    "Objective parameters file '{}' unusable ({}): falling back to defaults",
                    path.display(),
                    reason
                );
                return Self::default();
            }
        };

        if let Some(object) = section.as_object() {
            for key in object.keys() {
                if !OBJ_FUN_PARAM_KEYS.contains(&key.as_str()) {
                    warn!(
                        "Unknown objective parameter '{}' in '{}' ignored",
                        key,
                        path.display()
                    );
                }
            }
        }

        match serde_json::from_value::<WeightedLogParams>(section) {
            Ok(params) => params,
            Err(e) => {
                warn!(
                    "Objective parameters file '{}' has invalid values ({}): falling back to defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

fn read_section(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    value
        .get("objFunParams")
        .cloned()
        .ok_or_else(|| "missing 'objFunParams' object".to_string())
}

/// `-ln(eps + w_EE*EE + w_PE*PE) + lambda_T*T/T_max + lambda_W*W/W_max
///  + alpha_T*max(0, T - T_max)^hp + alpha_W*max(0, W - W_max)^hp`
///
/// The log term rewards efficiency with diminishing returns; the lambda
/// terms keep mild pressure toward thin, light shields inside the budgets;
/// the alpha terms punish overshoot hard. The shield's own weight is used
/// when known, otherwise the simulator-reported one.
pub struct WeightedLogEvaluator {
    params: WeightedLogParams,
    max_thickness: f64,
    max_weight: f64,
}

impl ObjectiveEvaluator for WeightedLogEvaluator {
    fn evaluate(&self, shield: &Shield, kpis: &KpiReport) -> f64 {
        let p = &self.params;
        let thickness = shield.total_thickness();
        let weight = shield.total_weight().unwrap_or(kpis.total_weight);

        let reward = p.epsilon + p.w_ee * kpis.energy_efficiency + p.w_pe * kpis.protection_efficiency;
        let mut value = -reward.ln();
        if self.max_thickness > 0.0 {
            value += p.lambda_t * thickness / self.max_thickness;
        }
        if self.max_weight > 0.0 {
            value += p.lambda_w * weight / self.max_weight;
        }
        value += p.alpha_t * (thickness - self.max_thickness).max(0.0).powf(p.hp_exponent);
        value += p.alpha_w * (weight - self.max_weight).max(0.0).powf(p.hp_exponent);
        value
    }
}
