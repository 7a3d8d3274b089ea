use super::{CatalogError, MaterialProps, MaterialsDatabase};
use std::path::Path;
use tracing::{debug, info, warn};

/// The ordered set of material names in scope for one optimization run,
/// with physical properties resolved from the optional database.
///
/// Immutable after load. A catalog without properties is valid but disables
/// weight- and stiffness-dependent features for the whole run.
#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    names: Vec<String>,
    props: Vec<Option<MaterialProps>>,
    has_properties: bool,
}

impl MaterialCatalog {
    /// Loads the newline-delimited materials list. Blank lines and lines
    /// starting with `#` are ignored; duplicates are tolerated but warned.
    pub fn load(path: &Path, database: Option<&MaterialsDatabase>) -> Result<Self, CatalogError> {
        info!(
            "Materials set in scope for the optimization is being initialized ({})",
            path.display()
        );
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let raw: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        let mut names: Vec<String> = Vec::new();
        let mut duplicates: Vec<String> = Vec::new();
        for item in raw {
            if names.iter().any(|n| n == item) {
                if !duplicates.iter().any(|d| d == item) {
                    duplicates.push(item.to_string());
                }
            } else {
                names.push(item.to_string());
            }
        }

        if !duplicates.is_empty() {
            warn!(
                "Found duplicate materials ({}): {}. Items in the materials file should be distinct.",
                duplicates.len(),
                duplicates.join(", ")
            );
        }
        if names.is_empty() {
            return Err(CatalogError::EmptyList {
                path: path.to_string_lossy().to_string(),
            });
        }

        let catalog = Self::from_names(names, database);
        info!(
            "Materials set loaded successfully (items: {})",
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn from_names(names: Vec<String>, database: Option<&MaterialsDatabase>) -> Self {
        let props: Vec<Option<MaterialProps>> = names
            .iter()
            .map(|n| database.and_then(|db| db.get(n)))
            .collect();
        let has_properties = !props.is_empty() && props.iter().all(Option::is_some);
        if !has_properties {
            debug!("Catalog has incomplete physical properties: weight/stiffness features disabled");
        }
        Self {
            names,
            props,
            has_properties,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn density(&self, name: &str) -> Option<f64> {
        self.index_of(name)
            .and_then(|i| self.props[i])
            .map(|p| p.density)
    }

    pub fn stiffness(&self, name: &str) -> Option<f64> {
        self.index_of(name)
            .and_then(|i| self.props[i])
            .map(|p| p.stiffness_modulus)
    }

    /// True when every material carries density and stiffness data, i.e. the
    /// database was loaded and covers the whole set.
    pub fn has_properties(&self) -> bool {
        self.has_properties
    }
}
