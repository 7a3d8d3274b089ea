//! Material selector encoding between layer lists and raw candidate vectors.
//!
//! Two selector schemes exist: plain catalog indices (or names, in the
//! categorical scheme), and the rotation encoding. In the rotation encoding
//! the first layer carries a plain index; every later selector is the rank of
//! the target material in the catalog ordering rotated to start just after
//! the previous layer's index. Ranks live in `[0, n-2]`, so the previous
//! material is unreachable and adjacent duplicates cannot be expressed.

use super::{ParamValue, RawPoint, SpaceError};
use crate::core::shield::Layer;

/// Rank of `target` in the catalog ordering rotated to start right after
/// `prev`. Pure modular arithmetic, no allocation.
pub fn rotated_rank(prev: usize, target: usize, n: usize) -> usize {
    (target + n - prev - 1) % n
}

/// Inverse of [`rotated_rank`]: catalog index selected by `rank` given the
/// previous layer's index.
pub fn rotated_index(prev: usize, rank: usize, n: usize) -> usize {
    (prev + 1 + rank) % n
}

pub(super) fn encode_materials(
    materials: &[String],
    names: &[String],
    by_index: bool,
    allow_adjacent_same: bool,
) -> Result<Vec<ParamValue>, SpaceError> {
    let mut encoded = Vec::with_capacity(names.len());
    let mut prev: Option<usize> = None;
    for name in names {
        let index = materials
            .iter()
            .position(|m| m == name)
            .ok_or_else(|| SpaceError::UnknownMaterial { name: name.clone() })?;
        if !by_index {
            encoded.push(ParamValue::Name(name.clone()));
            continue;
        }
        let selector = match prev {
            Some(p) if !allow_adjacent_same => rotated_rank(p, index, materials.len()),
            _ => index,
        };
        encoded.push(ParamValue::Int(selector as i64));
        prev = Some(index);
    }
    Ok(encoded)
}

pub(super) fn decode_layers(
    materials: &[String],
    point: &RawPoint,
    layers_offset: usize,
    fields_per_layer: usize,
    num_layers: usize,
    by_index: bool,
    rotation: bool,
) -> Result<Vec<Layer>, SpaceError> {
    let n = materials.len();
    let mut layers = Vec::with_capacity(num_layers);
    let mut prev: Option<usize> = None;

    for i in 0..num_layers {
        let base = layers_offset + i * fields_per_layer;
        let selector = &point[base];
        let thickness = point[base + 1].as_f64().filter(|t| t.is_finite()).ok_or_else(|| {
            SpaceError::BadPoint(format!(
                "layer {} thickness {:?} is not a finite number",
                i + 1,
                point[base + 1]
            ))
        })?;

        let material_index = if by_index {
            let raw = selector.as_index().ok_or_else(|| {
                SpaceError::BadPoint(format!(
                    "layer {} material selector {:?} is not a non-negative integer",
                    i + 1,
                    selector
                ))
            })?;
            match prev {
                Some(p) if rotation => {
                    if raw > n - 2 {
                        return Err(SpaceError::BadPoint(format!(
                            "layer {} rotation rank {} exceeds {} (materials: {})",
                            i + 1,
                            raw,
                            n - 2,
                            n
                        )));
                    }
                    rotated_index(p, raw, n)
                }
                _ => {
                    if raw >= n {
                        return Err(SpaceError::BadPoint(format!(
                            "layer {} material index {} exceeds {} (materials: {})",
                            i + 1,
                            raw,
                            n - 1,
                            n
                        )));
                    }
                    raw
                }
            }
        } else {
            let name = selector.as_name().ok_or_else(|| {
                SpaceError::BadPoint(format!(
                    "layer {} material selector {:?} is not a name",
                    i + 1,
                    selector
                ))
            })?;
            materials
                .iter()
                .position(|m| m == name)
                .ok_or_else(|| SpaceError::UnknownMaterial {
                    name: name.to_string(),
                })?
        };

        layers.push(Layer::new(materials[material_index].clone(), thickness));
        prev = Some(material_index);
    }
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_round_trips_for_all_pairs() {
        for n in 2..=5 {
            for prev in 0..n {
                for target in (0..n).filter(|t| *t != prev) {
                    let rank = rotated_rank(prev, target, n);
                    assert!(rank <= n - 2, "rank {rank} out of range for n={n}");
                    assert_eq!(rotated_index(prev, rank, n), target);
                }
            }
        }
    }

    #[test]
    fn rank_of_previous_material_is_maximal() {
        for n in 2..=5 {
            for prev in 0..n {
                assert_eq!(rotated_rank(prev, prev, n), n - 1);
            }
        }
    }

    fn abc() -> Vec<String> {
        vec!["A".into(), "B".into(), "C".into()]
    }

    #[test]
    fn rotation_encoding_of_known_sequence() {
        let names = vec!["B".to_string(), "C".to_string(), "A".to_string()];
        let encoded = encode_materials(&abc(), &names, true, false).unwrap();
        assert_eq!(
            encoded,
            vec![ParamValue::Int(1), ParamValue::Int(0), ParamValue::Int(0)]
        );
    }

    #[test]
    fn plain_index_encoding_keeps_catalog_indices() {
        let names = vec!["C".to_string(), "C".to_string(), "A".to_string()];
        let encoded = encode_materials(&abc(), &names, true, true).unwrap();
        assert_eq!(
            encoded,
            vec![ParamValue::Int(2), ParamValue::Int(2), ParamValue::Int(0)]
        );
    }

    #[test]
    fn encode_rejects_unknown_material() {
        let names = vec!["Zn".to_string()];
        assert!(matches!(
            encode_materials(&abc(), &names, true, false),
            Err(SpaceError::UnknownMaterial { name }) if name == "Zn"
        ));
    }

    fn point_from(selectors: &[ParamValue], thicknesses: &[f64], num_layers: usize) -> RawPoint {
        let mut point = vec![ParamValue::Int(num_layers as i64)];
        for (s, t) in selectors.iter().zip(thicknesses) {
            point.push(s.clone());
            point.push(ParamValue::Float(*t));
        }
        point
    }

    #[test]
    fn decode_inverts_rotation_encoding() {
        let names = vec!["B".to_string(), "C".to_string(), "A".to_string()];
        let encoded = encode_materials(&abc(), &names, true, false).unwrap();
        let point = point_from(&encoded, &[1.0, 2.0, 3.0], 3);
        let layers = decode_layers(&abc(), &point, 1, 2, 3, true, true).unwrap();
        let decoded: Vec<&str> = layers.iter().map(|l| l.material.as_str()).collect();
        assert_eq!(decoded, vec!["B", "C", "A"]);
    }

    #[test]
    fn decode_accepts_integer_valued_floats() {
        let point = point_from(
            &[ParamValue::Float(1.0), ParamValue::Float(0.0)],
            &[1.0, 2.0],
            2,
        );
        let layers = decode_layers(&abc(), &point, 1, 2, 2, true, true).unwrap();
        assert_eq!(layers[0].material, "B");
        assert_eq!(layers[1].material, "A");
    }

    #[test]
    fn decode_rejects_out_of_range_rotation_rank() {
        let point = point_from(
            &[ParamValue::Int(0), ParamValue::Int(2)],
            &[1.0, 2.0],
            2,
        );
        assert!(matches!(
            decode_layers(&abc(), &point, 1, 2, 2, true, true),
            Err(SpaceError::BadPoint(_))
        ));
    }

    #[test]
    fn decode_by_name_resolves_catalog_entries() {
        let point = point_from(
            &[ParamValue::Name("C".into()), ParamValue::Name("A".into())],
            &[4.0, 5.0],
            2,
        );
        let layers = decode_layers(&abc(), &point, 1, 2, 2, false, false).unwrap();
        assert_eq!(
            layers,
            vec![Layer::new("C", 4.0), Layer::new("A", 5.0)]
        );
    }
}
