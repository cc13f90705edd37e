use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("appliance '{0}' is listed more than once")]
    DuplicateAppliance(String),

    #[error("appliance '{name}' has invalid rating {rated_kw} kW (must be positive)")]
    InvalidRating { name: String, rated_kw: f64 },

    #[error("appliance name must not be empty")]
    EmptyName,
}

/// Failure to load the usage store as a whole.
///
/// Individual malformed rows never produce one of these; they are dropped.
#[derive(Debug, Error)]
pub enum ReadError {
    /// No store exists yet. Expected for a first-time user.
    #[error("usage store not found at {}", .0.display())]
    StoreNotFound(PathBuf),

    #[error("failed to read usage store: {0}")]
    StoreParse(String),
}
