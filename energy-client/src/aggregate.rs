//! Stateless summaries over a user's usage records.
//!
//! Everything here is pure: callers load and filter records first (see
//! [`crate::store`]) and pass the resulting slice in file order.

use std::{collections::BTreeMap, fmt};

use time::PrimitiveDateTime;

use crate::domain::UsageRecord;

/// Flat tariff applied to every kWh (INR).
pub const COST_PER_KWH: f64 = 8.0;

/// Totals strictly above this are `High`.
pub const HIGH_USAGE_KWH: f64 = 10.0;

/// Totals strictly above this (and not `High`) are `Moderate`.
pub const MODERATE_USAGE_KWH: f64 = 5.0;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AlertLevel {
    High,
    Moderate,
    Optimal,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Optimal => "Optimal",
        };
        f.write_str(s)
    }
}

/// Energy summed over every record sharing one timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeBucket {
    #[cfg_attr(feature = "serde", serde(with = "crate::domain::usage_record::store_timestamp"))]
    pub timestamp: PrimitiveDateTime,
    pub energy_kwh: f64,
}

/// Everything the dashboard shows for one user.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DashboardSummary {
    pub total_energy_kwh: f64,
    pub estimated_cost: f64,
    pub alert: AlertLevel,
    pub per_appliance: BTreeMap<String, f64>,
    pub time_series: Vec<TimeBucket>,
    pub recent: Vec<UsageRecord>,
}

pub fn total_energy(records: &[UsageRecord]) -> f64 {
    records.iter().map(|r| r.energy_kwh).sum()
}

pub fn estimated_cost(total_energy: f64) -> f64 {
    total_energy * COST_PER_KWH
}

pub fn alert_level(total_energy: f64) -> AlertLevel {
    if total_energy > HIGH_USAGE_KWH {
        AlertLevel::High
    } else if total_energy > MODERATE_USAGE_KWH {
        AlertLevel::Moderate
    } else {
        AlertLevel::Optimal
    }
}

pub fn per_appliance_totals(records: &[UsageRecord]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for r in records {
        *totals.entry(r.appliance.clone()).or_insert(0.0) += r.energy_kwh;
    }
    totals
}

/// Energy per exact timestamp, ascending.
///
/// Records logged in one action share a timestamp and collapse into a single
/// bucket regardless of appliance.
pub fn time_series(records: &[UsageRecord]) -> Vec<TimeBucket> {
    let mut buckets: BTreeMap<PrimitiveDateTime, f64> = BTreeMap::new();
    for r in records {
        *buckets.entry(r.timestamp).or_insert(0.0) += r.energy_kwh;
    }

    buckets
        .into_iter()
        .map(|(timestamp, energy_kwh)| TimeBucket {
            timestamp,
            energy_kwh,
        })
        .collect()
}

/// The last `n` records in file order.
pub fn recent(records: &[UsageRecord], n: usize) -> &[UsageRecord] {
    &records[records.len().saturating_sub(n)..]
}

pub fn summarize(records: &[UsageRecord], recent_limit: usize) -> DashboardSummary {
    let total_energy_kwh = total_energy(records);

    DashboardSummary {
        total_energy_kwh,
        estimated_cost: estimated_cost(total_energy_kwh),
        alert: alert_level(total_energy_kwh),
        per_appliance: per_appliance_totals(records),
        time_series: time_series(records),
        recent: recent(records, recent_limit).to_vec(),
    }
}
