pub mod appliance_selection;

pub use appliance_selection::{simulate_reading, ApplianceSelectionSource, UnknownAppliance};
