use crate::core::constraints::ConstraintSet;
use crate::core::kpi::KpiTargets;
use crate::core::materials::MaterialCatalog;
use crate::core::shield::Shield;
use crate::core::space::{RawPoint, SearchSpace};
use crate::engine::score::ObjectiveEvaluator;
use crate::engine::simulator::Simulator;
use tracing::{debug, info, warn};

/// Which gate converted an iteration into the penalty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyCause {
    Decode,
    PreCheck,
    Simulation,
    PostCheck,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Scored,
    /// Scored, and the configured performance targets are reached: the run
    /// should stop as a clean early success.
    TargetMet,
    Penalized(PenaltyCause),
}

/// One iteration's result. `value` is always finite: failed iterations
/// carry the configured penalty sentinel, so the optimizer never sees an
/// exception or a NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    pub outcome: Outcome,
}

/// Runs the per-iteration pipeline: decode and repair the raw candidate,
/// build the shield model, gate on the cheap pre-simulation constraints,
/// simulate, gate on the post-simulation constraints, score, and check the
/// performance targets. Strictly sequential; any failure short-circuits to
/// the penalty.
pub struct ObjectiveOrchestrator<'a> {
    space: &'a SearchSpace,
    catalog: &'a MaterialCatalog,
    constraints: &'a ConstraintSet,
    targets: KpiTargets,
    evaluator: Box<dyn ObjectiveEvaluator>,
    simulator: Box<dyn Simulator>,
    penalty: f64,
    stiffness_correction: f64,
    iteration: usize,
}

impl<'a> ObjectiveOrchestrator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        space: &'a SearchSpace,
        catalog: &'a MaterialCatalog,
        constraints: &'a ConstraintSet,
        targets: KpiTargets,
        evaluator: Box<dyn ObjectiveEvaluator>,
        simulator: Box<dyn Simulator>,
        penalty: f64,
        stiffness_correction: f64,
    ) -> Self {
        Self {
            space,
            catalog,
            constraints,
            targets,
            evaluator,
            simulator,
            penalty,
            stiffness_correction,
            iteration: 0,
        }
    }

    pub fn iterations(&self) -> usize {
        self.iteration
    }

    pub fn evaluate(&mut self, point: &RawPoint) -> Evaluation {
        self.iteration += 1;
        let it = self.iteration;
        debug!("Iteration #{} - begin", it);

        let (layers, repairs) = match self.space.layers_data(point, self.catalog) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Iteration #{}: candidate rejected before decode ({})", it, e);
                return self.penalized(it, "<undecodable>", 0, PenaltyCause::Decode);
            }
        };
        let shield = Shield::from_layers(layers, self.catalog, self.stiffness_correction);
        let desc = shield.layers_desc();

        if !self.constraints.pre_check(&shield) {
            return self.penalized(it, &desc, repairs.len(), PenaltyCause::PreCheck);
        }

        let (run_id, kpis) = match self.simulator.run(&shield) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Iteration #{}: simulation failed ({})", it, e);
                return self.penalized(it, &desc, repairs.len(), PenaltyCause::Simulation);
            }
        };

        if !self.constraints.post_check(&shield, &kpis) {
            return self.penalized(it, &desc, repairs.len(), PenaltyCause::PostCheck);
        }

        let value = self.evaluator.evaluate(&shield, &kpis);
        let target_met = self.targets.is_met(&kpis);
        info!(
            "It. #{} | run {} | [{}] | repairs: {} | PRE: OK | POST: OK | EE: {} | PE: {} | objective: {} | target met: {}",
            it,
            run_id,
            desc,
            repairs.len(),
            kpis.energy_efficiency,
            kpis.protection_efficiency,
            value,
            target_met
        );
        if target_met {
            info!(
                "Performance targets reached at iteration #{}: requesting early stop",
                it
            );
        }

        Evaluation {
            value,
            outcome: if target_met {
                Outcome::TargetMet
            } else {
                Outcome::Scored
            },
        }
    }

    fn penalized(
        &self,
        it: usize,
        desc: &str,
        repairs: usize,
        cause: PenaltyCause,
    ) -> Evaluation {
        info!(
            "It. #{} | [{}] | repairs: {} | failed at {:?} | objective: {} (penalty)",
            it, desc, repairs, cause, self.penalty
        );
        Evaluation {
            value: self.penalty,
            outcome: Outcome::Penalized(cause),
        }
    }
}
