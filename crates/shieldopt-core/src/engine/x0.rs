use crate::core::materials::MaterialCatalog;
use crate::core::space::{ParamValue, RawPoint, SearchSpace};
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct X0File {
    shield: X0Shield,
}

#[derive(Debug, Deserialize)]
struct X0Shield {
    layers: Vec<X0Layer>,
}

#[derive(Debug, Deserialize)]
struct X0Layer {
    material: String,
    thickness: f64,
}

/// Builds the initial candidate(s) handed to the optimizer's warm start.
///
/// File mode is strictly best effort: any problem with the file (unreadable,
/// malformed, unknown material, out-of-bounds thickness, wrong layer count)
/// yields no initial point, and the caller falls back.
pub struct X0Builder<'a> {
    space: &'a SearchSpace,
    catalog: &'a MaterialCatalog,
}

impl<'a> X0Builder<'a> {
    pub fn new(space: &'a SearchSpace, catalog: &'a MaterialCatalog) -> Self {
        Self { space, catalog }
    }

    /// Loads and encodes the initial shield description. Unused layer slots
    /// are padded with the placeholder material at the minimum thickness so
    /// the vector always has full dimensionality.
    pub fn from_file(&self, path: &Path) -> Option<RawPoint> {
        info!("Loading initial shield description: {}", path.display());
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Could not read X0 file '{}' ({}): no initial point",
                    path.display(),
                    e
                );
                return None;
            }
        };
        let parsed: X0File = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    "X0 file '{}' is malformed ({}): no initial point",
                    path.display(),
                    e
                );
                return None;
            }
        };

        let layers = parsed.shield.layers;
        for (i, layer) in layers.iter().enumerate() {
            if !self.catalog.contains(&layer.material) {
                warn!(
                    "X0 layer #{} uses unknown material '{}': no initial point",
                    i + 1,
                    layer.material
                );
                return None;
            }
            if layer.thickness < self.space.bounds().min_layer_thickness {
                warn!(
                    "X0 layer #{} thickness {} is below the minimum {}: no initial point",
                    i + 1,
                    layer.thickness,
                    self.space.bounds().min_layer_thickness
                );
                return None;
            }
        }

        let names: Vec<String> = layers.iter().map(|l| l.material.clone()).collect();
        let selectors = match self.space.encode_materials(&names) {
            Ok(selectors) => selectors,
            Err(e) => {
                warn!("X0 encoding failed ({}): no initial point", e);
                return None;
            }
        };

        let mut point: RawPoint = vec![ParamValue::Int(layers.len() as i64)];
        for (selector, layer) in selectors.into_iter().zip(&layers) {
            point.push(selector);
            point.push(ParamValue::Float(layer.thickness));
        }
        for _ in layers.len()..self.space.max_layers() {
            point.push(self.space.placeholder_material());
            point.push(ParamValue::Float(self.space.bounds().min_layer_thickness));
        }

        let errors = self.space.check_point(&point);
        if !errors.is_empty() {
            warn!(
                "X0 point rejected by the search space ({}): no initial point",
                errors.join("; ")
            );
            return None;
        }
        info!("Initial point built from '{}'", path.display());
        Some(point)
    }

    /// Synthesizes `count` random initial points by sampling the space
    /// directly, bypassing the optimizer's own generator.
    pub fn random(&self, count: usize, rng: &mut impl Rng) -> Vec<RawPoint> {
        debug!("Synthesizing {} random initial point(s)", count);
        (0..count).map(|_| self.space.sample(rng)).collect()
    }
}
