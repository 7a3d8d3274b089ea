use crate::core::materials::MaterialCatalog;
use crate::core::space::ShieldBounds;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
#[error("Declared bounds are infeasible ({}):\n  - {}", violations.len(), violations.join("\n  - "))]
pub struct FeasibilityError {
    pub violations: Vec<String>,
}

/// Checks that the declared bounds admit at least one shield, before any
/// optimizer work starts. All detected inconsistencies are reported together
/// so the user can fix the configuration in one pass.
pub fn check_bounds(
    bounds: &ShieldBounds,
    catalog: &MaterialCatalog,
) -> Result<(), FeasibilityError> {
    info!("Feasibility check of the declared bounds - begin");
    let mut violations = Vec::new();

    if bounds.min_layers == 0 {
        violations.push("min_layers must be at least 1".to_string());
    }
    if bounds.min_layers > bounds.max_layers {
        violations.push(format!(
            "min_layers ({}) exceeds max_layers ({})",
            bounds.min_layers, bounds.max_layers
        ));
    }
    if bounds.min_layer_thickness <= 0.0 {
        violations.push(format!(
            "min_layer_thickness ({}) must be positive",
            bounds.min_layer_thickness
        ));
    }
    if bounds.min_layer_thickness > bounds.max_layer_thickness {
        violations.push(format!(
            "min_layer_thickness ({}) exceeds max_layer_thickness ({})",
            bounds.min_layer_thickness, bounds.max_layer_thickness
        ));
    }
    if bounds.min_shield_thickness < 0.0 {
        violations.push(format!(
            "min_shield_thickness ({}) must not be negative",
            bounds.min_shield_thickness
        ));
    }
    if bounds.min_shield_thickness > bounds.max_shield_thickness {
        violations.push(format!(
            "min_shield_thickness ({}) exceeds max_shield_thickness ({})",
            bounds.min_shield_thickness, bounds.max_shield_thickness
        ));
    }
    if bounds.max_shield_weight <= 0.0 {
        violations.push(format!(
            "max_shield_weight ({}) must be positive",
            bounds.max_shield_weight
        ));
    }

    // Thinnest admissible shield vs. the thickness ceiling.
    let thinnest = bounds.min_layers as f64 * bounds.min_layer_thickness;
    if thinnest > bounds.max_shield_thickness {
        violations.push(format!(
            "the thinnest admissible shield ({} layers x {} = {}) already exceeds max_shield_thickness ({})",
            bounds.min_layers, bounds.min_layer_thickness, thinnest, bounds.max_shield_thickness
        ));
    }

    // Thickest admissible shield vs. the thickness floor.
    let thickest = bounds.max_layers as f64 * bounds.max_layer_thickness;
    if thickest < bounds.min_shield_thickness {
        violations.push(format!(
            "the thickest admissible shield ({} layers x {} = {}) cannot reach min_shield_thickness ({})",
            bounds.max_layers, bounds.max_layer_thickness, thickest, bounds.min_shield_thickness
        ));
    }

    // Lightest admissible shield vs. the weight ceiling, when density data
    // is available for every material.
    if catalog.has_properties() {
        let min_density = catalog
            .names()
            .iter()
            .filter_map(|n| catalog.density(n))
            .fold(f64::INFINITY, f64::min);
        if min_density.is_finite() {
            let lightest = thinnest * min_density;
            if lightest > bounds.max_shield_weight {
                violations.push(format!(
                    "the lightest admissible shield (weight {}) already exceeds max_shield_weight ({})",
                    lightest, bounds.max_shield_weight
                ));
            }
        }
    } else {
        debug!("No full density coverage: weight feasibility not assessed");
    }

    if violations.is_empty() {
        info!("Feasibility check of the declared bounds - complete (no violations)");
        Ok(())
    } else {
        Err(FeasibilityError { violations })
    }
}

/// The optimizer needs its warm-up points plus at least one model-driven
/// evaluation inside the call budget.
pub fn check_call_budget(n_calls: usize, n_initial_points: usize) -> Result<(), FeasibilityError> {
    if n_calls < n_initial_points + 1 {
        Err(FeasibilityError {
            violations: vec![format!(
                "call budget ({n_calls}) must exceed the number of initial points ({n_initial_points})"
            )],
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::materials::MaterialsDatabase;
    use std::fs;
    use tempfile::tempdir;

    fn feasible_bounds() -> ShieldBounds {
        ShieldBounds {
            min_layers: 1,
            max_layers: 5,
            min_layer_thickness: 0.5,
            max_layer_thickness: 10.0,
            min_shield_thickness: 1.0,
            max_shield_thickness: 30.0,
            max_shield_weight: 500.0,
        }
    }

    fn catalog() -> MaterialCatalog {
        MaterialCatalog::from_names(vec!["Al".into(), "Pb".into()], None)
    }

    #[test]
    fn feasible_bounds_pass() {
        assert!(check_bounds(&feasible_bounds(), &catalog()).is_ok());
    }

    #[test]
    fn single_thick_layer_exceeding_shield_maximum_is_reported() {
        let bounds = ShieldBounds {
            min_layers: 1,
            max_layers: 1,
            min_layer_thickness: 5.0,
            max_layer_thickness: 10.0,
            min_shield_thickness: 0.0,
            max_shield_thickness: 3.0,
            max_shield_weight: 500.0,
        };
        let err = check_bounds(&bounds, &catalog()).unwrap_err();
        assert!(
            err.violations
                .iter()
                .any(|v| v.contains("thinnest admissible shield"))
        );
    }

    #[test]
    fn all_violations_are_reported_together() {
        let bounds = ShieldBounds {
            min_layers: 3,
            max_layers: 1,
            min_layer_thickness: 8.0,
            max_layer_thickness: 2.0,
            min_shield_thickness: 50.0,
            max_shield_thickness: 10.0,
            max_shield_weight: 500.0,
        };
        let err = check_bounds(&bounds, &catalog()).unwrap_err();
        assert!(err.violations.len() >= 4);
    }

    #[test]
    fn call_budget_must_exceed_initial_points() {
        assert!(check_call_budget(201, 200).is_ok());
        assert!(check_call_budget(200, 200).is_err());
    }

    #[test]
    fn weight_infeasibility_needs_density_data() {
        let mut bounds = feasible_bounds();
        bounds.min_layers = 5;
        bounds.min_layer_thickness = 10.0;
        bounds.max_shield_thickness = 60.0;
        bounds.max_shield_weight = 1.0;

        // Without densities the weight cannot be assessed.
        assert!(check_bounds(&bounds, &catalog()).is_ok());

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
        let dense = MaterialCatalog::from_names(vec!["Al".into(), "Pb".into()], Some(&db));
        let err = check_bounds(&bounds, &dense).unwrap_err();
        assert!(
            err.violations
                .iter()
                .any(|v| v.contains("lightest admissible shield"))
        );
    }
}
