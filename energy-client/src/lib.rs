pub mod aggregate;
pub mod domain;
pub mod error;
pub mod store;

pub use domain::{ApplianceCatalogEntry, Catalog, UsageRecord, UserName};
pub use error::{CatalogError, ReadError};
