pub mod usage_csv;

pub use usage_csv::{load_all, load_for_user, StoreSnapshot};
