use crate::core::kpi::KpiReport;
use crate::core::shield::Shield;
use tracing::{debug, info, warn};

/// Per-run constraint thresholds, immutable once the run starts.
///
/// The pre-simulation gate reads every field; the post-simulation gate only
/// revisits `max_weight`, and only when the weight was unknown before the
/// simulation ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    pub max_layer_thickness: f64,
    pub min_shield_thickness: f64,
    pub max_shield_thickness: f64,
    pub max_weight: f64,
    pub min_stiffness: f64,
    pub max_stiffness: f64,
    pub max_cost: f64,
}

/// Relative tolerance for the pre/post weight consistency warning.
const WEIGHT_AGREEMENT_TOLERANCE: f64 = 1e-6;

impl ConstraintSet {
    /// Cheap gate evaluated before the external simulation. Every violated
    /// threshold is logged; the shield is rejected if any gating check fails.
    pub fn pre_check(&self, shield: &Shield) -> bool {
        debug!("Pre-sim constraints check - begin");
        let mut passed = true;

        // Stiffness is advisory: out-of-range values are reported but do
        // not gate the iteration.
        let stiffness = shield.stiffness();
        if stiffness < self.min_stiffness || stiffness > self.max_stiffness {
            warn!(
                "Shield stiffness {} outside advisory range [{}, {}]",
                stiffness, self.min_stiffness, self.max_stiffness
            );
        }

        let thickness = shield.total_thickness();
        if thickness < self.min_shield_thickness || thickness > self.max_shield_thickness {
            warn!(
                "Shield thickness {} outside allowed range [{}, {}] --> REJECTED",
                thickness, self.min_shield_thickness, self.max_shield_thickness
            );
            passed = false;
        }

        if let Some(weight) = shield.total_weight() {
            if !self.weight_within_limit(weight, "pre-sim") {
                passed = false;
            }
        } else {
            debug!("Shield weight unknown in pre-sim phase: weight check deferred to post-sim");
        }

        let max_layer = shield.max_effective_layer_thickness();
        if max_layer > self.max_layer_thickness {
            warn!(
                "Max effective layer thickness {} exceeds limit {} --> REJECTED",
                max_layer, self.max_layer_thickness
            );
            passed = false;
        }

        if shield.tco() > self.max_cost {
            warn!(
                "Shield cost {} exceeds limit {} --> REJECTED",
                shield.tco(),
                self.max_cost
            );
            passed = false;
        }

        info!(
            "Pre-sim constraints check - complete (passed: {})",
            passed
        );
        passed
    }

    /// Gate evaluated after the simulation, against the simulator-reported
    /// weight. Gating only happens when the pre-sim weight was unknown; a
    /// known pre-sim weight already gated, so a disagreement is just warned.
    pub fn post_check(&self, shield: &Shield, kpis: &KpiReport) -> bool {
        debug!("Post-sim constraints check - begin");
        let passed = match shield.total_weight() {
            Some(expected) => {
                let reported = kpis.total_weight;
                let scale = expected.abs().max(1.0);
                if (expected - reported).abs() > WEIGHT_AGREEMENT_TOLERANCE * scale {
                    warn!(
                        "Simulator-reported weight {} disagrees with the computed weight {}",
                        reported, expected
                    );
                }
                true
            }
            None => self.weight_within_limit(kpis.total_weight, "post-sim"),
        };
        info!(
            "Post-sim constraints check - complete (passed: {})",
            passed
        );
        passed
    }

    /// Single weight validation routine shared by both gates, so the two
    /// paths cannot drift apart.
    fn weight_within_limit(&self, weight: f64, phase: &str) -> bool {
        if weight > self.max_weight {
            warn!(
                "Shield weight {} exceeds limit {} ({} phase) --> REJECTED",
                weight, self.max_weight, phase
            );
            false
        } else {
            debug!(
                "Shield weight {} within limit {} ({} phase)",
                weight, self.max_weight, phase
            );
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::materials::{MaterialCatalog, MaterialsDatabase};
    use crate::core::shield::Layer;
    use std::fs;
    use tempfile::tempdir;

    fn constraints() -> ConstraintSet {
        ConstraintSet {
            max_layer_thickness: 8.0,
            min_shield_thickness: 2.0,
            max_shield_thickness: 20.0,
            max_weight: 100.0,
            min_stiffness: 0.0,
            max_stiffness: f64::INFINITY,
            max_cost: f64::INFINITY,
        }
    }

    fn catalog_with_props() -> MaterialCatalog {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"materials": [
                {"matname": "Al", "matdensity": 2.0, "mat_E": 69.0},
                {"matname": "Pb", "matdensity": 10.0, "mat_E": 16.0}
            ]}"#,
        )
        .unwrap();
        let db = MaterialsDatabase::load(&path).unwrap();
        MaterialCatalog::from_names(vec!["Al".into(), "Pb".into()], Some(&db))
    }

    fn bare_catalog() -> MaterialCatalog {
        MaterialCatalog::from_names(vec!["Al".into(), "Pb".into()], None)
    }

    fn kpis(weight: f64) -> KpiReport {
        KpiReport {
            total_thickness: 0.0,
            total_weight: weight,
            energy_efficiency: 0.0,
            protection_efficiency: 0.0,
        }
    }

    #[test]
    fn pre_check_passes_a_feasible_shield() {
        let shield = Shield::from_layers(
            vec![Layer::new("Al", 3.0), Layer::new("Pb", 2.0)],
            &catalog_with_props(),
            1.0,
        );
        assert!(constraints().pre_check(&shield));
    }

    #[test]
    fn pre_check_rejects_thickness_out_of_range() {
        let shield = Shield::from_layers(vec![Layer::new("Al", 1.0)], &catalog_with_props(), 1.0);
        assert!(!constraints().pre_check(&shield));
    }

    #[test]
    fn pre_check_rejects_overweight_shield() {
        // 15 * 10 = 150 > 100.
        let mut limits = constraints();
        limits.max_layer_thickness = 20.0;
        let shield = Shield::from_layers(vec![Layer::new("Pb", 15.0)], &catalog_with_props(), 1.0);
        assert!(!limits.pre_check(&shield));
    }

    #[test]
    fn pre_check_rejects_oversized_effective_layer() {
        let shield = Shield::from_layers(
            vec![Layer::new("Al", 5.0), Layer::new("Al", 5.0)],
            &catalog_with_props(),
            1.0,
        );
        // Two mergeable layers form a 10.0 slab against the 8.0 limit.
        assert!(!constraints().pre_check(&shield));
    }

    #[test]
    fn pre_check_ignores_unknown_weight() {
        let shield = Shield::from_layers(
            vec![Layer::new("Al", 3.0), Layer::new("Pb", 2.0)],
            &bare_catalog(),
            1.0,
        );
        assert!(constraints().pre_check(&shield));
    }

    #[test]
    fn stiffness_out_of_range_does_not_gate() {
        let mut limits = constraints();
        limits.max_stiffness = 1.0;
        let shield = Shield::from_layers(
            vec![Layer::new("Al", 3.0), Layer::new("Pb", 2.0)],
            &catalog_with_props(),
            1.0,
        );
        assert!(limits.pre_check(&shield));
    }

    #[test]
    fn post_check_gates_on_reported_weight_when_unknown() {
        let shield = Shield::from_layers(vec![Layer::new("Al", 3.0)], &bare_catalog(), 1.0);
        assert!(constraints().post_check(&shield, &kpis(50.0)));
        assert!(!constraints().post_check(&shield, &kpis(150.0)));
    }

    #[test]
    fn post_check_never_gates_when_weight_was_known() {
        let shield = Shield::from_layers(vec![Layer::new("Pb", 2.0)], &catalog_with_props(), 1.0);
        // Disagreement is warned, never rejected.
        assert!(constraints().post_check(&shield, &kpis(999.0)));
    }
}
