mod encoding;
mod trim;

pub use encoding::{rotated_index, rotated_rank};
pub use trim::{TrimBudgets, trim_layers};

use crate::core::materials::MaterialCatalog;
use crate::core::shield::{Layer, has_adjacent_same_materials};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("Invalid search space bounds: {0}")]
    InvalidBounds(String),

    #[error("Material '{name}' not found in materials list")]
    UnknownMaterial { name: String },

    #[error("Invalid candidate point: {0}")]
    BadPoint(String),
}

/// One value of a raw optimization vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Name(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Name(_) => None,
        }
    }

    /// Integer view, accepting integer-valued floats (history files round-trip
    /// through JSON, which does not distinguish 3 from 3.0).
    pub fn as_index(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            ParamValue::Name(n) => Some(n),
            _ => None,
        }
    }
}

/// A raw candidate vector: one value per search-space dimension.
pub type RawPoint = Vec<ParamValue>;

/// One dimension of the optimization vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    Integer { name: String, low: i64, high: i64 },
    Real { name: String, low: f64, high: f64 },
    Categorical { name: String, categories: Vec<String> },
}

impl Dimension {
    pub fn name(&self) -> &str {
        match self {
            Dimension::Integer { name, .. } => name,
            Dimension::Real { name, .. } => name,
            Dimension::Categorical { name, .. } => name,
        }
    }

    pub fn contains(&self, value: &ParamValue) -> bool {
        match self {
            Dimension::Integer { low, high, .. } => match value {
                ParamValue::Int(v) => *v >= *low && *v <= *high,
                ParamValue::Float(v) => {
                    v.fract() == 0.0 && *v >= *low as f64 && *v <= *high as f64
                }
                ParamValue::Name(_) => false,
            },
            Dimension::Real { low, high, .. } => match value.as_f64() {
                Some(v) => v >= *low && v <= *high,
                None => false,
            },
            Dimension::Categorical { categories, .. } => match value.as_name() {
                Some(n) => categories.iter().any(|c| c == n),
                None => false,
            },
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match self {
            Dimension::Integer { low, high, .. } => ParamValue::Int(rng.gen_range(*low..=*high)),
            Dimension::Real { low, high, .. } => ParamValue::Float(rng.gen_range(*low..=*high)),
            Dimension::Categorical { categories, .. } => {
                let idx = rng.gen_range(0..categories.len());
                ParamValue::Name(categories[idx].clone())
            }
        }
    }
}

/// Hard geometric and weight bounds of the optimization problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ShieldBounds {
    pub min_layers: usize,
    pub max_layers: usize,
    pub min_layer_thickness: f64,
    pub max_layer_thickness: f64,
    pub min_shield_thickness: f64,
    pub max_shield_thickness: f64,
    pub max_shield_weight: f64,
}

/// The closed set of search-space builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceVariant {
    /// Materials by name, no repair: infeasible candidates are left to the
    /// constraint gates.
    Base,
    /// Materials by plain index; the candidate tail is trimmed against the
    /// thickness and weight budgets.
    AdvTrimming,
    /// As `AdvTrimming`, with the rotation-index encoding enforcing that no
    /// two adjacent layers share a material.
    AdvRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpaceOptions {
    materials_by_index: bool,
    allow_adjacent_same: bool,
    trim_thickness: bool,
    trim_weight: bool,
}

impl SpaceVariant {
    fn options(self) -> SpaceOptions {
        match self {
            SpaceVariant::Base => SpaceOptions {
                materials_by_index: false,
                allow_adjacent_same: true,
                trim_thickness: false,
                trim_weight: false,
            },
            SpaceVariant::AdvTrimming => SpaceOptions {
                materials_by_index: true,
                allow_adjacent_same: true,
                trim_thickness: true,
                trim_weight: true,
            },
            SpaceVariant::AdvRotation => SpaceOptions {
                materials_by_index: true,
                allow_adjacent_same: false,
                trim_thickness: true,
                trim_weight: true,
            },
        }
    }
}

/// Fixed-dimension description of the optimization vector.
///
/// Layout: dimension 0 is the layer count; thereafter each of `max_layers`
/// slots contributes a material-selector dimension followed by a thickness
/// dimension. The total dimension count `1 + 2*max_layers` is fixed for the
/// run's lifetime.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    dimensions: Vec<Dimension>,
    options: SpaceOptions,
    bounds: ShieldBounds,
    materials: Vec<String>,
    num_layers_idx: usize,
    layers_offset: usize,
    fields_per_layer: usize,
}

impl SearchSpace {
    pub fn build(
        bounds: ShieldBounds,
        catalog: &MaterialCatalog,
        variant: SpaceVariant,
    ) -> Result<Self, SpaceError> {
        let options = variant.options();
        info!(
            "Search space definition - begin (variant: {:?}, materials by index: {}, adjacent same materials allowed: {})",
            variant, options.materials_by_index, options.allow_adjacent_same
        );
        info!(
            "Shield trimming by thickness: {}, by weight: {}",
            options.trim_thickness, options.trim_weight
        );

        if bounds.min_layers == 0 || bounds.max_layers == 0 {
            return Err(SpaceError::InvalidBounds(
                "layer counts must be positive".to_string(),
            ));
        }
        if bounds.min_layers > bounds.max_layers {
            return Err(SpaceError::InvalidBounds(format!(
                "min_layers ({}) exceeds max_layers ({})",
                bounds.min_layers, bounds.max_layers
            )));
        }
        if bounds.min_layer_thickness > bounds.max_layer_thickness {
            return Err(SpaceError::InvalidBounds(format!(
                "min_layer_thickness ({}) exceeds max_layer_thickness ({})",
                bounds.min_layer_thickness, bounds.max_layer_thickness
            )));
        }
        if catalog.is_empty() {
            return Err(SpaceError::InvalidBounds(
                "materials catalog is empty".to_string(),
            ));
        }
        if !options.allow_adjacent_same && catalog.len() < 2 {
            return Err(SpaceError::InvalidBounds(
                "rotation encoding needs at least two materials".to_string(),
            ));
        }

        let num_materials = catalog.len();
        let mut dimensions = vec![Dimension::Integer {
            name: "num_layers".to_string(),
            low: bounds.min_layers as i64,
            high: bounds.max_layers as i64,
        }];
        debug!(
            "Search space - added num. layers parameter [0], range: [{}-{}]",
            bounds.min_layers, bounds.max_layers
        );

        for i in 0..bounds.max_layers {
            if options.materials_by_index {
                // Slots after the first lose one selector value in rotation
                // mode: the rotated ordering never reaches the previous
                // layer's material.
                let high = if options.allow_adjacent_same || i == 0 {
                    num_materials - 1
                } else {
                    num_materials - 2
                };
                dimensions.push(Dimension::Integer {
                    name: format!("material_index_{}", i + 1),
                    low: 0,
                    high: high as i64,
                });
                debug!(
                    "Search space - added material index #{} (range: 0-{})",
                    i, high
                );
            } else {
                dimensions.push(Dimension::Categorical {
                    name: format!("material_{}", i + 1),
                    categories: catalog.names().to_vec(),
                });
                debug!("Search space - added material #{} (categorical)", i);
            }
            dimensions.push(Dimension::Real {
                name: format!("thickness_{}", i + 1),
                low: bounds.min_layer_thickness,
                high: bounds.max_layer_thickness,
            });
            debug!("Search space - added thickness #{}", i);
        }

        info!("Search space definition - complete");
        Ok(Self {
            dimensions,
            options,
            bounds,
            materials: catalog.names().to_vec(),
            num_layers_idx: 0,
            layers_offset: 1,
            fields_per_layer: 2,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dim(&self) -> usize {
        self.dimensions.len()
    }

    pub fn bounds(&self) -> &ShieldBounds {
        &self.bounds
    }

    pub fn max_layers(&self) -> usize {
        self.bounds.max_layers
    }

    pub fn materials_by_index(&self) -> bool {
        self.options.materials_by_index
    }

    pub fn adjacent_same_material_allowed(&self) -> bool {
        self.options.allow_adjacent_same
    }

    pub fn has_thickness_trimming(&self) -> bool {
        self.options.trim_thickness
    }

    pub fn has_weight_trimming(&self) -> bool {
        self.options.trim_weight
    }

    /// Samples one raw candidate, one value per dimension.
    pub fn sample(&self, rng: &mut impl Rng) -> RawPoint {
        self.dimensions.iter().map(|d| d.sample(rng)).collect()
    }

    /// Per-dimension validation; an empty vector means the point is valid.
    pub fn check_point(&self, point: &RawPoint) -> Vec<String> {
        if point.len() != self.dim() {
            return vec![format!(
                "point has dimension {} but expected {}",
                point.len(),
                self.dim()
            )];
        }
        let mut errors = Vec::new();
        for (j, (value, dim)) in point.iter().zip(self.dimensions.iter()).enumerate() {
            if !dim.contains(value) {
                errors.push(format!(
                    "dim {} ({}): value {:?} outside the declared domain",
                    j,
                    dim.name(),
                    value
                ));
            }
        }
        errors
    }

    /// Encodes material names into the raw selector values of this space.
    pub fn encode_materials(&self, names: &[String]) -> Result<Vec<ParamValue>, SpaceError> {
        encoding::encode_materials(
            &self.materials,
            names,
            self.options.materials_by_index,
            self.options.allow_adjacent_same,
        )
    }

    /// Raw selector value used to pad unused layer slots.
    pub fn placeholder_material(&self) -> ParamValue {
        if self.options.materials_by_index {
            ParamValue::Int(0)
        } else {
            ParamValue::Name(self.materials[0].clone())
        }
    }

    /// Inverse of the selector encoding: recovers the declared (untrimmed)
    /// layer list from a raw candidate.
    pub fn decode_point(&self, point: &RawPoint) -> Result<Vec<Layer>, SpaceError> {
        if point.len() != self.dim() {
            return Err(SpaceError::BadPoint(format!(
                "point has dimension {} but expected {}",
                point.len(),
                self.dim()
            )));
        }
        let num_layers = point[self.num_layers_idx]
            .as_index()
            .filter(|n| *n <= self.bounds.max_layers)
            .ok_or_else(|| {
                SpaceError::BadPoint(format!(
                    "bad layer count value {:?}",
                    point[self.num_layers_idx]
                ))
            })?;
        encoding::decode_layers(
            &self.materials,
            point,
            self.layers_offset,
            self.fields_per_layer,
            num_layers,
            self.options.materials_by_index,
            !self.options.allow_adjacent_same,
        )
    }

    /// Decodes a raw candidate and repairs it against the hard budgets.
    ///
    /// Returns the feasible layer list together with the repair warnings
    /// describing any trimming-induced constraint violations.
    pub fn layers_data(
        &self,
        point: &RawPoint,
        catalog: &MaterialCatalog,
    ) -> Result<(Vec<Layer>, Vec<String>), SpaceError> {
        let decoded = self.decode_point(point)?;

        let budgets = TrimBudgets {
            thickness: self
                .options
                .trim_thickness
                .then_some(self.bounds.max_shield_thickness),
            // Weight trimming needs density data; without it the weight
            // budget cannot be converted into a thickness allowance.
            weight: (self.options.trim_weight && catalog.has_properties())
                .then_some(self.bounds.max_shield_weight),
        };

        if budgets.thickness.is_none() && budgets.weight.is_none() {
            debug!("Shield trimming is DISABLED - returning original layers structure AS IS");
            if has_adjacent_same_materials(&decoded) {
                warn!("The shield has consecutive layers with same material!");
            }
            return Ok((decoded, Vec::new()));
        }

        let thickness_pretrim: f64 = decoded.iter().map(|l| l.thickness).sum();
        let trimmed = trim_layers(&decoded, &budgets, catalog);
        let thickness: f64 = trimmed.iter().map(|l| l.thickness).sum();

        let warnings = if thickness < thickness_pretrim {
            warn!(
                "The shield was TRIMMED in pre-sim phase to avoid constraints violation: (Num. layers, Thickness): ({}, {}) ---> ({}, {})",
                decoded.len(),
                thickness_pretrim,
                trimmed.len(),
                thickness
            );
            trim::repair_warnings(&trimmed, &self.bounds, thickness_pretrim, thickness)
        } else {
            debug!(
                "No shield trimming took place. (Num. layers, Thickness): ({}, {}) ---> ({}, {})",
                decoded.len(),
                thickness_pretrim,
                trimmed.len(),
                thickness
            );
            Vec::new()
        };

        if has_adjacent_same_materials(&trimmed) {
            warn!("The shield has consecutive layers with same material!");
        }
        Ok((trimmed, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bounds() -> ShieldBounds {
        ShieldBounds {
            min_layers: 1,
            max_layers: 3,
            min_layer_thickness: 0.5,
            max_layer_thickness: 10.0,
            min_shield_thickness: 1.0,
            max_shield_thickness: 25.0,
            max_shield_weight: 300.0,
        }
    }

    fn catalog() -> MaterialCatalog {
        MaterialCatalog::from_names(vec!["A".into(), "B".into(), "C".into()], None)
    }

    #[test]
    fn dimension_count_is_one_plus_two_per_slot() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::AdvRotation).unwrap();
        assert_eq!(space.dim(), 1 + 2 * 3);
    }

    #[test]
    fn rotation_variant_narrows_later_selector_ranges() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::AdvRotation).unwrap();
        match &space.dimensions()[1] {
            Dimension::Integer { low, high, .. } => {
                assert_eq!((*low, *high), (0, 2));
            }
            other => panic!("unexpected dimension: {other:?}"),
        }
        match &space.dimensions()[3] {
            Dimension::Integer { low, high, .. } => {
                assert_eq!((*low, *high), (0, 1));
            }
            other => panic!("unexpected dimension: {other:?}"),
        }
    }

    #[test]
    fn base_variant_uses_categorical_materials() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::Base).unwrap();
        assert!(matches!(
            &space.dimensions()[1],
            Dimension::Categorical { categories, .. } if categories.len() == 3
        ));
    }

    #[test]
    fn build_rejects_inverted_layer_bounds() {
        let mut b = bounds();
        b.min_layers = 5;
        assert!(matches!(
            SearchSpace::build(b, &catalog(), SpaceVariant::Base),
            Err(SpaceError::InvalidBounds(_))
        ));
    }

    #[test]
    fn sampled_points_are_always_valid() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::AdvRotation).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let point = space.sample(&mut rng);
            assert!(space.check_point(&point).is_empty());
        }
    }

    #[test]
    fn sampling_handles_equal_thickness_bounds() {
        let mut b = bounds();
        b.min_layer_thickness = 2.0;
        b.max_layer_thickness = 2.0;
        let space = SearchSpace::build(b, &catalog(), SpaceVariant::AdvRotation).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let point = space.sample(&mut rng);
            assert!(space.check_point(&point).is_empty());
            assert_eq!(point[2], ParamValue::Float(2.0));
        }
    }

    #[test]
    fn check_point_flags_out_of_bounds_values() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::AdvRotation).unwrap();
        let mut point = space.sample(&mut StdRng::seed_from_u64(1));
        point[2] = ParamValue::Float(99.0);
        let errors = space.check_point(&point);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("thickness_1"));
    }

    #[test]
    fn check_point_flags_dimension_mismatch() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::Base).unwrap();
        let errors = space.check_point(&vec![ParamValue::Int(1)]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("expected 7"));
    }

    #[test]
    fn decode_point_respects_declared_layer_count() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::AdvTrimming).unwrap();
        let point = vec![
            ParamValue::Int(2),
            ParamValue::Int(0),
            ParamValue::Float(1.5),
            ParamValue::Int(2),
            ParamValue::Float(2.5),
            ParamValue::Int(1),
            ParamValue::Float(3.5),
        ];
        let layers = space.decode_point(&point).unwrap();
        assert_eq!(
            layers,
            vec![Layer::new("A", 1.5), Layer::new("C", 2.5)]
        );
    }

    #[test]
    fn layers_data_skips_trimming_for_base_variant() {
        let space = SearchSpace::build(bounds(), &catalog(), SpaceVariant::Base).unwrap();
        let point = vec![
            ParamValue::Int(3),
            ParamValue::Name("A".into()),
            ParamValue::Float(10.0),
            ParamValue::Name("B".into()),
            ParamValue::Float(10.0),
            ParamValue::Name("C".into()),
            ParamValue::Float(10.0),
        ];
        let (layers, warnings) = space.layers_data(&point, &catalog()).unwrap();
        assert_eq!(layers.len(), 3);
        assert!(warnings.is_empty());
        let total: f64 = layers.iter().map(|l| l.thickness).sum();
        assert!(total > bounds().max_shield_thickness);
    }
}
