use std::pin::Pin;

use energy_client::{
    domain::usage_record::{round2, READING_VARIANCE, STATUS_ON},
    Catalog, UsageRecord, UserName,
};
use futures::Stream;
use rand::Rng;
use time::PrimitiveDateTime;

use crate::pipeline::{Envelope, PipelineError, Source};

/// Turns one logging action (user + selected appliances) into usage records.
///
/// Every appliance is resolved against the catalog when the source is built,
/// so an unknown name fails the whole action before anything is streamed.
pub struct ApplianceSelectionSource {
    records: Vec<UsageRecord>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown appliance: {0}")]
pub struct UnknownAppliance(pub String);

impl ApplianceSelectionSource {
    pub fn new<R, A>(
        catalog: &Catalog,
        user: &UserName,
        appliances: &[A],
        timestamp: PrimitiveDateTime,
        rng: &mut R,
    ) -> Result<Self, UnknownAppliance>
    where
        R: Rng + ?Sized,
        A: AsRef<str>,
    {
        let mut records = Vec::with_capacity(appliances.len());

        for appliance in appliances {
            let appliance = appliance.as_ref();
            let rated_kw = catalog
                .rated_kw(appliance)
                .ok_or_else(|| UnknownAppliance(appliance.to_string()))?;

            records.push(UsageRecord {
                timestamp,
                user: user.as_str().to_string(),
                appliance: appliance.to_string(),
                status: STATUS_ON,
                kw_rating: rated_kw,
                energy_kwh: simulate_reading(rated_kw, rng),
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }
}

/// A reading drawn uniformly from ±20% of the rated draw, rounded to 0.01 kWh.
pub fn simulate_reading<R: Rng + ?Sized>(rated_kw: f64, rng: &mut R) -> f64 {
    let factor = rng.gen_range((1.0 - READING_VARIANCE)..=(1.0 + READING_VARIANCE));
    round2(rated_kw * factor)
}

#[async_trait::async_trait]
impl Source<UsageRecord> for ApplianceSelectionSource {
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<UsageRecord>, PipelineError>> + Send>> {
        let records = self.records.clone();
        let s = async_stream::stream! {
            for (seq, record) in records.into_iter().enumerate() {
                yield Ok::<_, PipelineError>(Envelope::new(record, seq));
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use rand::{rngs::StdRng, SeedableRng};
    use time::macros::datetime;

    fn user() -> UserName {
        UserName::parse(" Ana ").unwrap()
    }

    #[test]
    fn readings_stay_within_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for rated_kw in [0.08, 0.1, 0.2, 0.5, 1.2, 1.5] {
            for _ in 0..500 {
                let reading = simulate_reading(rated_kw, &mut rng);
                assert!(reading >= round2(rated_kw * 0.8) - 1e-9, "{reading} < band for {rated_kw}");
                assert!(reading <= round2(rated_kw * 1.2) + 1e-9, "{reading} > band for {rated_kw}");
            }
        }
    }

    #[test]
    fn builds_one_record_per_selection_in_order() {
        let catalog = Catalog::default();
        let ts = datetime!(2024-05-01 08:15:00);
        let mut rng = StdRng::seed_from_u64(1);

        let source =
            ApplianceSelectionSource::new(&catalog, &user(), &["Microwave", "Lights"], ts, &mut rng)
                .unwrap();

        let records = source.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].appliance, "Microwave");
        assert_eq!(records[0].kw_rating, 1.2);
        assert_eq!(records[1].appliance, "Lights");
        assert!(records.iter().all(|r| r.timestamp == ts));
        assert!(records.iter().all(|r| r.status == STATUS_ON));
        assert!(records.iter().all(|r| r.user == "Ana"));
    }

    #[test]
    fn unknown_appliance_fails_whole_selection() {
        let catalog = Catalog::default();
        let mut rng = StdRng::seed_from_u64(1);

        let err = ApplianceSelectionSource::new(
            &catalog,
            &user(),
            &["Lights", "Jacuzzi"],
            datetime!(2024-05-01 08:15:00),
            &mut rng,
        )
        .err();

        assert_eq!(err, Some(UnknownAppliance("Jacuzzi".to_string())));
    }

    #[tokio::test]
    async fn streams_records_with_sequence_numbers() {
        let catalog = Catalog::default();
        let mut rng = StdRng::seed_from_u64(3);
        let source = ApplianceSelectionSource::new(
            &catalog,
            &user(),
            &["Television", "Refrigerator"],
            datetime!(2024-05-01 08:15:00),
            &mut rng,
        )
        .unwrap();

        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 2);
        let second = items[1].as_ref().unwrap();
        assert_eq!(second.seq, 1);
        assert_eq!(second.payload.appliance, "Refrigerator");
    }
}
