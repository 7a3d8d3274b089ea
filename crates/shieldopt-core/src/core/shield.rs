use crate::core::materials::MaterialCatalog;
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// One decoded (material, thickness) pair of a shield stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub material: String,
    pub thickness: f64,
}

impl Layer {
    pub fn new(material: impl Into<String>, thickness: f64) -> Self {
        Self {
            material: material.into(),
            thickness,
        }
    }
}

/// Derived physical aggregate of a feasible layer list, built once per
/// iteration and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Shield {
    layers: Vec<Layer>,
    total_thickness: f64,
    /// Absent when the catalog carries no density data; callers must treat
    /// this as "unknown", not zero.
    total_weight: Option<f64>,
    stiffness: f64,
    max_effective_layer_thickness: f64,
    tco: f64,
}

impl Shield {
    /// Builds the aggregate from an already repaired layer list.
    ///
    /// `cf_factor` is the stiffness correction factor applied when the
    /// per-layer contributions are normalized by the total thickness.
    pub fn from_layers(layers: Vec<Layer>, catalog: &MaterialCatalog, cf_factor: f64) -> Self {
        debug!("Initializing shield");
        let with_properties = catalog.has_properties();

        let mut total_thickness = 0.0;
        let mut total_weight = if with_properties { Some(0.0) } else { None };
        let mut stiffness_sum = 0.0;

        for layer in &layers {
            total_thickness += layer.thickness;
            if with_properties {
                // The catalog guarantees full coverage when has_properties is set.
                let density = catalog.density(&layer.material).unwrap_or(0.0);
                let modulus = catalog.stiffness(&layer.material).unwrap_or(0.0);
                let weight = layer.thickness * density;
                if let Some(w) = total_weight.as_mut() {
                    *w += weight;
                }
                stiffness_sum += layer.thickness * modulus;
                debug!(
                    "Appending layer {{{}, thick: {}, wgt: {}, stiff.: {}}}",
                    layer.material,
                    layer.thickness,
                    weight,
                    layer.thickness * modulus
                );
            } else {
                debug!(
                    "Appending layer {{{}, thick: {}, wgt: n.a., stiff.: n.a.}}",
                    layer.material, layer.thickness
                );
            }
        }

        let stiffness = if total_thickness > 0.0 {
            let value = (cf_factor * stiffness_sum) / total_thickness;
            info!("Stiffness evaluated (CF: {}): {}", cf_factor, value);
            value
        } else {
            warn!("Zero total thickness --> shield stiffness forced to zero");
            0.0
        };

        let max_effective_layer_thickness = merged_max_layer_thickness(&layers);
        debug!(
            "Shield init. Tot. thickness: {}, max effective layer thickness: {}",
            total_thickness, max_effective_layer_thickness
        );

        Self {
            layers,
            total_thickness,
            total_weight,
            stiffness,
            max_effective_layer_thickness,
            tco: 0.0,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn total_thickness(&self) -> f64 {
        self.total_thickness
    }

    pub fn total_weight(&self) -> Option<f64> {
        self.total_weight
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Size of the largest layer, with consecutive layers of the same
    /// material counted as one slab: (plastic, 2.1) followed by
    /// (plastic, 3.2) is regarded as (plastic, 5.3).
    pub fn max_effective_layer_thickness(&self) -> f64 {
        self.max_effective_layer_thickness
    }

    /// Total cost of ownership. Cost modelling is not implemented yet, so
    /// this is constantly zero; the constraint gate still applies.
    pub fn tco(&self) -> f64 {
        self.tco
    }

    /// Read-only geometry projection handed to geometry-file generation.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_desc(&self) -> String {
        let mut desc = String::new();
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                desc.push_str(", ");
            }
            let _ = write!(desc, "{} ({:.4})", layer.material, layer.thickness);
        }
        desc
    }
}

/// Merges consecutive layers sharing a material before taking the maximum
/// thickness; physically adjacent same-material layers behave as one slab.
fn merged_max_layer_thickness(layers: &[Layer]) -> f64 {
    let mut merged: Vec<(&str, f64)> = Vec::new();
    let mut consecutive_same = 0usize;
    for layer in layers {
        match merged.last_mut() {
            Some((material, thickness)) if *material == layer.material => {
                *thickness += layer.thickness;
                consecutive_same += 1;
            }
            _ => merged.push((&layer.material, layer.thickness)),
        }
    }
    if consecutive_same > 0 {
        debug!(
            "The shield has consecutive layers made of the same material (occurrences: {})",
            consecutive_same
        );
    }
    merged
        .iter()
        .map(|(_, t)| *t)
        .fold(0.0, f64::max)
}

/// True when any two adjacent layers share a material.
pub fn has_adjacent_same_materials(layers: &[Layer]) -> bool {
    layers
        .windows(2)
        .any(|pair| pair[0].material == pair[1].material)
}
