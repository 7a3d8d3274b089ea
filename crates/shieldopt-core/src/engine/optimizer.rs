use crate::core::space::{RawPoint, SearchSpace};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything observed during one minimize call: all evaluated points, their
/// objective values in ask order, and the best pair found. This is also the
/// record shape persisted by the history manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub points: Vec<RawPoint>,
    pub values: Vec<f64>,
    pub best_point: Option<RawPoint>,
    pub best_value: Option<f64>,
}

impl OptimizeResult {
    pub fn record(&mut self, point: RawPoint, value: f64) {
        if self.best_value.is_none_or(|best| value < best) {
            self.best_point = Some(point.clone());
            self.best_value = Some(value);
        }
        self.points.push(point);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Verdict of the per-iteration callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Ask/tell minimization contract over a search space.
///
/// `warm_points`/`warm_values` are prior evaluations replayed into the
/// result without re-evaluation; `x0` are unevaluated candidates tried
/// before any sampling. The callback runs after every fresh evaluation and
/// may stop the loop; the n-th tell always matches the n-th ask.
pub trait AskTellOptimizer {
    #[allow(clippy::too_many_arguments)]
    fn minimize(
        &mut self,
        space: &SearchSpace,
        warm_points: Vec<RawPoint>,
        warm_values: Vec<f64>,
        x0: Vec<RawPoint>,
        n_calls: usize,
        objective: &mut dyn FnMut(&RawPoint) -> f64,
        callback: &mut dyn FnMut(&OptimizeResult) -> LoopControl,
    ) -> OptimizeResult;
}

/// Uniform random search over the space. No surrogate model: every ask is
/// an independent sample, which keeps the ask/tell plumbing honest and the
/// crate runnable end to end.
#[derive(Debug)]
pub struct RandomSearchOptimizer {
    rng: StdRng,
}

impl RandomSearchOptimizer {
    /// Seeded deterministically from `random_state`, or from OS entropy
    /// when no seed is configured.
    pub fn new(random_state: Option<u64>) -> Self {
        let rng = match random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl AskTellOptimizer for RandomSearchOptimizer {
    fn minimize(
        &mut self,
        space: &SearchSpace,
        warm_points: Vec<RawPoint>,
        warm_values: Vec<f64>,
        x0: Vec<RawPoint>,
        n_calls: usize,
        objective: &mut dyn FnMut(&RawPoint) -> f64,
        callback: &mut dyn FnMut(&OptimizeResult) -> LoopControl,
    ) -> OptimizeResult {
        let mut result = OptimizeResult::default();
        for (point, value) in warm_points.into_iter().zip(warm_values) {
            result.record(point, value);
        }
        if !result.is_empty() {
            info!(
                "Optimizer warm-started with {} prior evaluations (best so far: {:?})",
                result.len(),
                result.best_value
            );
        }

        let mut x0 = x0.into_iter();
        for iteration in 0..n_calls {
            let point = match x0.next() {
                Some(point) => {
                    debug!("Iteration {}: evaluating supplied initial point", iteration);
                    point
                }
                None => space.sample(&mut self.rng),
            };
            let value = objective(&point);
            result.record(point, value);
            if callback(&result) == LoopControl::Stop {
                info!(
                    "Optimizer loop stopped by callback after {} evaluation(s)",
                    iteration + 1
                );
                break;
            }
        }
        result
    }
}
