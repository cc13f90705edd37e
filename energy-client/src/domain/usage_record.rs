use time::{format_description::BorrowedFormatItem, macros::format_description, PrimitiveDateTime};

/// `Status` value written for every record: the appliance was on.
pub const STATUS_ON: i64 = 1;

/// Canonical store columns, in positional order.
pub const STORE_COLUMNS: [&str; 6] = [
    "Timestamp",
    "User",
    "Appliance",
    "Status",
    "KW_Rating",
    "Energy_kWh",
];

/// `YYYY-MM-DD HH:MM:SS`, the only timestamp layout the store uses.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Readings are simulated within this fraction of the rated draw.
pub const READING_VARIANCE: f64 = 0.2;

#[cfg(feature = "serde")]
pub(crate) mod store_timestamp {
    use time::PrimitiveDateTime;

    time::serde::format_description!(
        layout,
        PrimitiveDateTime,
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    );

    pub(crate) use layout::serialize;
}

/// One logged reading for one appliance at one point in time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UsageRecord {
    #[cfg_attr(feature = "serde", serde(with = "store_timestamp"))]
    pub timestamp: PrimitiveDateTime,
    pub user: String,
    pub appliance: String,
    pub status: i64,
    pub kw_rating: f64,
    pub energy_kwh: f64,
}

impl UsageRecord {
    pub fn formatted_timestamp(&self) -> Result<String, time::error::Format> {
        self.timestamp.format(TIMESTAMP_FORMAT)
    }

    /// Store row for this record, in `STORE_COLUMNS` order.
    pub fn to_fields(&self) -> Result<[String; 6], time::error::Format> {
        Ok([
            self.formatted_timestamp()?,
            self.user.clone(),
            self.appliance.clone(),
            self.status.to_string(),
            self.kw_rating.to_string(),
            self.energy_kwh.to_string(),
        ])
    }

    /// Whether `energy_kwh` lies within ±20% of `kw_rating`, allowing for the
    /// two-decimal rounding applied when the reading was taken.
    pub fn energy_within_band(&self) -> bool {
        let slack = 0.005 + 1e-9;
        let low = self.kw_rating * (1.0 - READING_VARIANCE) - slack;
        let high = self.kw_rating * (1.0 + READING_VARIANCE) + slack;
        (low..=high).contains(&self.energy_kwh)
    }
}

pub fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(s.trim(), TIMESTAMP_FORMAT)
}

/// Round to two decimal places, the precision readings are stored at.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(kw_rating: f64, energy_kwh: f64) -> UsageRecord {
        UsageRecord {
            timestamp: datetime!(2024-03-01 18:30:05),
            user: "Ana".to_string(),
            appliance: "Lights".to_string(),
            status: STATUS_ON,
            kw_rating,
            energy_kwh,
        }
    }

    #[test]
    fn fields_follow_store_layout() {
        let fields = record(0.08, 0.07).to_fields().unwrap();
        assert_eq!(
            fields,
            [
                "2024-03-01 18:30:05".to_string(),
                "Ana".to_string(),
                "Lights".to_string(),
                "1".to_string(),
                "0.08".to_string(),
                "0.07".to_string(),
            ]
        );
    }

    #[test]
    fn timestamp_parses_store_layout() {
        let ts = parse_timestamp("2024-03-01 18:30:05").unwrap();
        assert_eq!(ts, datetime!(2024-03-01 18:30:05));
        assert!(parse_timestamp("2024-03-01T18:30:05Z").is_err());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn band_accepts_rounded_extremes() {
        // 0.08 * 0.8 = 0.064 rounds down to 0.06
        assert!(record(0.08, 0.06).energy_within_band());
        assert!(record(0.08, 0.1).energy_within_band());
        assert!(record(1.5, 1.2).energy_within_band());
        assert!(record(1.5, 1.8).energy_within_band());
    }

    #[test]
    fn band_rejects_outliers() {
        assert!(!record(1.5, 1.1).energy_within_band());
        assert!(!record(1.5, 1.9).energy_within_band());
        assert!(!record(0.1, 0.0).energy_within_band());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_timestamp_in_store_layout() {
        let value = serde_json::to_value(record(0.08, 0.07)).unwrap();
        assert_eq!(value["timestamp"], "2024-03-01 18:30:05");
        assert_eq!(value["appliance"], "Lights");
        assert_eq!(value["energy_kwh"], 0.07);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(0.123), 0.12);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(0.08), 0.08);
    }
}
