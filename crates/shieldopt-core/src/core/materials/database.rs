use super::CatalogError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Physical properties of one material, as loaded from the database file.
///
/// Thickness is expressed in mm and density in g/cm^3, so that their product
/// is a surface density in kg/m^2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProps {
    pub density: f64,
    pub stiffness_modulus: f64,
}

#[derive(Debug, Deserialize)]
struct DatabaseFile {
    materials: Vec<DatabaseEntry>,
}

#[derive(Debug, Deserialize)]
struct DatabaseEntry {
    matname: Option<String>,
    matdensity: Option<f64>,
    #[serde(rename = "mat_E")]
    mat_e: Option<f64>,
}

/// Optional database of per-material physical properties.
///
/// The database is an all-or-nothing component: a single malformed entry
/// fails the whole load, and a run configured without a database simply
/// loses weight- and stiffness-dependent features.
#[derive(Debug, Default, Clone)]
pub struct MaterialsDatabase {
    materials: HashMap<String, MaterialProps>,
}

impl MaterialsDatabase {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        info!(
            "Materials database initialization ongoing (source: {})",
            path.display()
        );

        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let parsed: DatabaseFile =
            serde_json::from_str(&content).map_err(|e| CatalogError::Json {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut materials = HashMap::new();
        let mut duplicates = Vec::new();
        for (index, entry) in parsed.materials.iter().enumerate() {
            let name = entry
                .matname
                .as_deref()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| CatalogError::BadEntry {
                    index,
                    message: "missing material name".to_string(),
                })?;
            let density = entry
                .matdensity
                .filter(|d| *d > 0.0)
                .ok_or_else(|| CatalogError::BadEntry {
                    index,
                    message: format!("missing or non-positive density for '{name}'"),
                })?;
            let stiffness_modulus =
                entry
                    .mat_e
                    .filter(|e| *e > 0.0)
                    .ok_or_else(|| CatalogError::BadEntry {
                        index,
                        message: format!("missing or non-positive stiffness modulus for '{name}'"),
                    })?;

            if materials.contains_key(name) {
                if !duplicates.contains(&name.to_string()) {
                    duplicates.push(name.to_string());
                }
            } else {
                materials.insert(
                    name.to_string(),
                    MaterialProps {
                        density,
                        stiffness_modulus,
                    },
                );
                debug!(
                    "Database item loaded: {} (density={}, E={})",
                    name, density, stiffness_modulus
                );
            }
        }

        if materials.is_empty() {
            return Err(CatalogError::EmptyDatabase {
                path: path.to_string_lossy().to_string(),
            });
        }
        if !duplicates.is_empty() {
            warn!(
                "Materials database contains duplicate items ({}): {}. Entries should be distinct.",
                duplicates.len(),
                duplicates.join(", ")
            );
        }

        info!(
            "Materials database loaded successfully (items: {})",
            materials.len()
        );
        Ok(Self { materials })
    }

    pub fn get(&self, name: &str) -> Option<MaterialProps> {
        self.materials.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Names from `names` that have no database entry.
    pub fn missing_from(&self, names: &[String]) -> Vec<String> {
        let mut missing = Vec::new();
        for name in names {
            if !self.materials.contains_key(name) && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
        missing
    }

    /// Fails when any of the given materials is absent from the database.
    pub fn assert_contains(&self, names: &[String]) -> Result<(), CatalogError> {
        let missing = self.missing_from(names);
        if missing.is_empty() {
            debug!("Materials set is entirely contained in the materials database");
            Ok(())
        } else {
            Err(CatalogError::MissingFromDatabase { missing })
        }
    }

    /// Shrinks the in-memory replica to the materials actually in scope.
    pub fn reduce_to(&mut self, names: &[String]) {
        let before = self.materials.len();
        self.materials.retain(|k, _| names.contains(k));
        if self.materials.len() < before {
            info!(
                "In-memory replica of the materials database has reduced size: {} --> {}",
                before,
                self.materials.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_db(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("materials_db.json");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_succeeds_with_valid_entries() {
        let (_dir, path) = write_db(
            r#"{"materials": [
                {"matname": "G4_Pb", "matdensity": 11.35, "mat_E": 16.0},
                {"matname": "G4_Ti", "matdensity": 4.54, "mat_E": 116.0}
            ]}"#,
        );
        let db = MaterialsDatabase::load(&path).unwrap();
        assert_eq!(db.len(), 2);
        let pb = db.get("G4_Pb").unwrap();
        assert_eq!(pb.density, 11.35);
        assert_eq!(pb.stiffness_modulus, 16.0);
    }

    #[test]
    fn load_fails_on_non_positive_density() {
        let (_dir, path) = write_db(
            r#"{"materials": [
                {"matname": "G4_Pb", "matdensity": 0.0, "mat_E": 16.0}
            ]}"#,
        );
        assert!(matches!(
            MaterialsDatabase::load(&path),
            Err(CatalogError::BadEntry { index: 0, .. })
        ));
    }

    #[test]
    fn load_fails_on_missing_stiffness() {
        let (_dir, path) = write_db(
            r#"{"materials": [
                {"matname": "G4_Pb", "matdensity": 11.35}
            ]}"#,
        );
        assert!(matches!(
            MaterialsDatabase::load(&path),
            Err(CatalogError::BadEntry { .. })
        ));
    }

    #[test]
    fn duplicate_entries_keep_first_occurrence() {
        let (_dir, path) = write_db(
            r#"{"materials": [
                {"matname": "G4_Pb", "matdensity": 11.35, "mat_E": 16.0},
                {"matname": "G4_Pb", "matdensity": 1.0, "mat_E": 1.0}
            ]}"#,
        );
        let db = MaterialsDatabase::load(&path).unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("G4_Pb").unwrap().density, 11.35);
    }

    #[test]
    fn assert_contains_reports_missing_names() {
        let (_dir, path) = write_db(
            r#"{"materials": [
                {"matname": "G4_Pb", "matdensity": 11.35, "mat_E": 16.0}
            ]}"#,
        );
        let db = MaterialsDatabase::load(&path).unwrap();
        let err = db
            .assert_contains(&["G4_Pb".to_string(), "G4_Cu".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingFromDatabase { missing } if missing == vec!["G4_Cu".to_string()]
        ));
    }

    #[test]
    fn reduce_to_drops_out_of_scope_materials() {
        let (_dir, path) = write_db(
            r#"{"materials": [
                {"matname": "G4_Pb", "matdensity": 11.35, "mat_E": 16.0},
                {"matname": "G4_Ti", "matdensity": 4.54, "mat_E": 116.0}
            ]}"#,
        );
        let mut db = MaterialsDatabase::load(&path).unwrap();
        db.reduce_to(&["G4_Ti".to_string()]);
        assert_eq!(db.len(), 1);
        assert!(db.get("G4_Pb").is_none());
    }
}
