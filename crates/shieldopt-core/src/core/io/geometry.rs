use crate::core::shield::Shield;
use serde_json::{Map, Value, json};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Geometry template '{path}' must contain a non-empty 'layers' array")]
    MissingLayers { path: String },
}

/// Geometry template document handed to the simulator after the shield's
/// layer list is spliced in.
///
/// The template's own `layers` entries describe the fixed downstream
/// structure (detector, casing) and stay in place; the optimized shield
/// layers are inserted in front of them. An optional `layerCommonProps`
/// object provides defaults merged into every generated layer.
#[derive(Debug, Clone)]
pub struct GeometryTemplate {
    document: Map<String, Value>,
}

impl GeometryTemplate {
    pub fn load(path: &Path) -> Result<Self, GeometryError> {
        info!("Loading geometry template: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| GeometryError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| GeometryError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let document = match value {
            Value::Object(map) => map,
            _ => {
                return Err(GeometryError::MissingLayers {
                    path: path.to_string_lossy().to_string(),
                });
            }
        };
        let has_layers = document
            .get("layers")
            .and_then(Value::as_array)
            .is_some_and(|a| !a.is_empty());
        if !has_layers {
            return Err(GeometryError::MissingLayers {
                path: path.to_string_lossy().to_string(),
            });
        }

        debug!("Geometry template loaded successfully");
        Ok(Self { document })
    }

    /// Builds the run-specific geometry document with the shield's layers
    /// inserted before the template's own entries.
    pub fn with_shield(&self, shield: &Shield) -> Value {
        let common = self
            .document
            .get("layerCommonProps")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut generated: Vec<Value> = Vec::with_capacity(shield.num_layers());
        for (i, layer) in shield.layers().iter().enumerate() {
            let mut entry = common.clone();
            entry.insert(
                "name".to_string(),
                json!(format!("L{:03}-{}", i + 1, layer.material)),
            );
            entry.insert("material".to_string(), json!(layer.material));
            entry.insert("thickness".to_string(), json!(layer.thickness));
            generated.push(Value::Object(entry));
        }

        let mut document = self.document.clone();
        if let Some(Value::Array(existing)) = document.get_mut("layers") {
            generated.extend(existing.drain(..));
            *existing = generated;
        }
        Value::Object(document)
    }

    /// Writes the run-specific geometry file for the simulator.
    pub fn write(&self, path: &Path, shield: &Shield) -> Result<(), GeometryError> {
        let document = self.with_shield(shield);
        let content =
            serde_json::to_string_pretty(&document).map_err(|e| GeometryError::Json {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        std::fs::write(path, content).map_err(|e| GeometryError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        info!("Geometry file written: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::materials::MaterialCatalog;
    use crate::core::shield::Layer;
    use std::fs;
    use tempfile::tempdir;

    fn template(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geometry_template.json");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn shield() -> Shield {
        let catalog = MaterialCatalog::from_names(vec!["Al".into(), "Cu".into()], None);
        Shield::from_layers(
            vec![Layer::new("Al", 2.0), Layer::new("Cu", 3.5)],
            &catalog,
            1.0,
        )
    }

    #[test]
    fn load_requires_non_empty_layers() {
        let (_dir, path) = template(r#"{"layers": []}"#);
        assert!(matches!(
            GeometryTemplate::load(&path),
            Err(GeometryError::MissingLayers { .. })
        ));
    }

    #[test]
    fn shield_layers_are_inserted_before_template_layers() {
        let (_dir, path) = template(
            r#"{"layers": [{"name": "detector", "material": "Si", "thickness": 1.0}]}"#,
        );
        let doc = GeometryTemplate::load(&path).unwrap().with_shield(&shield());
        let layers = doc["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0]["name"], "L001-Al");
        assert_eq!(layers[1]["name"], "L002-Cu");
        assert_eq!(layers[1]["thickness"], 3.5);
        assert_eq!(layers[2]["name"], "detector");
    }

    #[test]
    fn common_props_are_merged_into_generated_layers() {
        let (_dir, path) = template(
            r#"{
                "layerCommonProps": {"unit": "mm", "thickness": -1},
                "layers": [{"name": "detector"}]
            }"#,
        );
        let doc = GeometryTemplate::load(&path).unwrap().with_shield(&shield());
        let layers = doc["layers"].as_array().unwrap();
        assert_eq!(layers[0]["unit"], "mm");
        // Generated fields override the common defaults.
        assert_eq!(layers[0]["thickness"], 2.0);
        assert_eq!(layers[0]["material"], "Al");
    }

    #[test]
    fn write_produces_parseable_json() {
        let (dir, path) = template(r#"{"layers": [{"name": "detector"}]}"#);
        let template = GeometryTemplate::load(&path).unwrap();
        let out = dir.path().join("geometry_42.json");
        template.write(&out, &shield()).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["layers"].as_array().unwrap().len(), 3);
    }
}
