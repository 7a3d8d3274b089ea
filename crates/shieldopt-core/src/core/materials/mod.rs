mod catalog;
mod database;

pub use catalog::MaterialCatalog;
pub use database::{MaterialProps, MaterialsDatabase};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
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

    #[error("Materials database entry #{index} is invalid: {message}")]
    BadEntry { index: usize, message: String },

    #[error("Materials database '{path}' contains no usable entries")]
    EmptyDatabase { path: String },

    #[error("Materials list '{path}' must contain at least one material")]
    EmptyList { path: String },

    #[error("Materials missing from the database ({}): {}", missing.len(), missing.join(", "))]
    MissingFromDatabase { missing: Vec<String> },
}
