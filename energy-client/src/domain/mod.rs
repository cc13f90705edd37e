pub mod catalog;
pub mod usage_record;
pub mod user_name;

pub use catalog::{ApplianceCatalogEntry, Catalog};
pub use usage_record::UsageRecord;
pub use user_name::UserName;
