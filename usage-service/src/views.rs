use std::fmt::Write as _;

use energy_client::{Catalog, UsageRecord};

use crate::recorder::{LogError, ValidationError};

pub fn home() -> String {
    "Smart Home Energy Dashboard\n\n\
     Welcome! This app helps track and visualize energy usage in your smart home.\n\n\
     Log which appliances are on with `log`, then explore your usage with `dashboard`.\n"
        .to_string()
}

pub fn appliances(catalog: &Catalog) -> String {
    let width = catalog.names().map(|n| n.chars().count()).max().unwrap_or(0);
    let mut out = String::from("Appliances\n");
    for entry in catalog.entries() {
        let _ = writeln!(out, "  {:<width$}  {:>5} kW", entry.name, entry.rated_kw);
    }
    out
}

/// Confirmation or warning shown after a logging attempt.
pub fn log_outcome(result: &Result<Vec<UsageRecord>, LogError>) -> String {
    match result {
        Ok(rows) => {
            let user = rows.first().map(|r| r.user.as_str()).unwrap_or_default();
            let mut out = format!("Usage logged for {user}!\n");
            for r in rows {
                let _ = writeln!(out, "  {:<16} {:.2} kWh", r.appliance, r.energy_kwh);
            }
            out
        }
        Err(LogError::Validation(ValidationError::EmptyUserName)) => {
            "Please enter your name before logging.\n".to_string()
        }
        Err(LogError::Validation(ValidationError::NoAppliancesSelected)) => {
            "Please select at least one appliance.\n".to_string()
        }
        Err(LogError::UnknownAppliance(name)) => {
            format!("'{name}' is not a known appliance. Run `appliances` to list them.\n")
        }
        Err(e) => format!("Could not log usage: {e}\n"),
    }
}
