use super::ShieldBounds;
use crate::core::materials::MaterialCatalog;
use crate::core::shield::Layer;
use tracing::debug;

/// Hard budgets enforced by the deterministic repair step. `None` disables
/// the corresponding budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimBudgets {
    pub thickness: Option<f64>,
    pub weight: Option<f64>,
}

/// Clips a decoded layer list against the thickness and weight budgets.
///
/// Layers are consumed front to back. Each layer gets the remaining
/// allowance; a layer that does not fit whole is clipped to what is left and
/// ends the shield. The result is a prefix of the input with at most the
/// last kept layer thinned, so layer order and materials are never reshuffled.
pub fn trim_layers(
    layers: &[Layer],
    budgets: &TrimBudgets,
    catalog: &MaterialCatalog,
) -> Vec<Layer> {
    let mut kept = Vec::with_capacity(layers.len());
    let mut accum_thickness = 0.0;
    let mut accum_weight = 0.0;

    for layer in layers {
        let allowed_thickness = budgets
            .thickness
            .map_or(f64::INFINITY, |b| b - accum_thickness);
        let allowed_weight = budgets.weight.map_or(f64::INFINITY, |b| b - accum_weight);
        if allowed_thickness <= 0.0 || allowed_weight <= 0.0 {
            break;
        }

        let density = catalog.density(&layer.material);
        let weight_cap = match (budgets.weight, density) {
            (Some(_), Some(d)) if d > 0.0 => allowed_weight / d,
            _ => f64::INFINITY,
        };

        let clipped = layer.thickness.min(allowed_thickness).min(weight_cap);
        if clipped > 0.0 {
            accum_thickness += clipped;
            if let Some(d) = density {
                accum_weight += clipped * d;
            }
            debug!(
                "Trim pass kept layer {{{}, {}}} (requested: {})",
                layer.material, clipped, layer.thickness
            );
            kept.push(Layer::new(layer.material.clone(), clipped));
        }
        if clipped < layer.thickness {
            break;
        }
    }
    kept
}

/// Constraint violations caused by the trimming itself, reported so the
/// run history can explain why a repaired candidate was penalized.
pub(super) fn repair_warnings(
    trimmed: &[Layer],
    bounds: &ShieldBounds,
    thickness_before: f64,
    thickness_after: f64,
) -> Vec<String> {
    let mut warnings = vec![format!(
        "shield trimmed from {:.4} to {:.4} total thickness",
        thickness_before, thickness_after
    )];
    if trimmed.len() < bounds.min_layers {
        warnings.push(format!(
            "trimming left {} layers, below the minimum of {}",
            trimmed.len(),
            bounds.min_layers
        ));
    }
    if let Some(thinnest) = trimmed
        .iter()
        .map(|l| l.thickness)
        .min_by(|a, b| a.total_cmp(b))
    {
        if thinnest < bounds.min_layer_thickness {
            warnings.push(format!(
                "trimming produced a layer of thickness {:.4}, below the minimum of {}",
                thinnest, bounds.min_layer_thickness
            ));
        }
    }
    if thickness_after < bounds.min_shield_thickness {
        warnings.push(format!(
            "trimmed shield thickness {:.4} is below the minimum of {}",
            thickness_after, bounds.min_shield_thickness
        ));
    }
    warnings
}
