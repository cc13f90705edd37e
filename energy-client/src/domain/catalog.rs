use std::collections::HashSet;

use crate::error::CatalogError;

/// Rated power draw for one appliance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ApplianceCatalogEntry {
    pub name: String,
    pub rated_kw: f64,
}

/// Fixed table of appliance name to rated power (kW).
///
/// Built once at startup and only read afterwards. Entries keep the order they
/// were supplied in, which is the order they are offered for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: Vec<ApplianceCatalogEntry>,
}

const DEFAULT_APPLIANCES: [(&str, f64); 6] = [
    ("Air Conditioner", 1.5),
    ("Refrigerator", 0.2),
    ("Washing Machine", 0.5),
    ("Television", 0.1),
    ("Microwave", 1.2),
    ("Lights", 0.08),
];

impl Catalog {
    pub fn new<I, S>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for (name, rated_kw) in entries {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !rated_kw.is_finite() || rated_kw <= 0.0 {
                return Err(CatalogError::InvalidRating { name, rated_kw });
            }
            if !seen.insert(name.clone()) {
                return Err(CatalogError::DuplicateAppliance(name));
            }
            out.push(ApplianceCatalogEntry { name, rated_kw });
        }

        Ok(Self { entries: out })
    }

    pub fn rated_kw(&self, appliance: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.name == appliance)
            .map(|e| e.rated_kw)
    }

    pub fn contains(&self, appliance: &str) -> bool {
        self.rated_kw(appliance).is_some()
    }

    pub fn entries(&self) -> &[ApplianceCatalogEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_APPLIANCES
                .iter()
                .map(|(name, rated_kw)| ApplianceCatalogEntry {
                    name: (*name).to_string(),
                    rated_kw: *rated_kw,
                })
                .collect(),
        }
    }
}
