use crate::{
    metrics_server::LOG_REJECTED,
    pipeline::{Envelope, PipelineError, Transform},
};
use energy_client::{domain::usage_record::STATUS_ON, UsageRecord};

/// Pure validation of a `UsageRecord` about to be stored.
///
/// Rules:
/// - user and appliance must be non-empty.
/// - status must be the ON flag.
/// - energy must lie within ±20% of the rated draw (after rounding).
pub fn validate_usage_record(env: Envelope<UsageRecord>) -> Result<Envelope<UsageRecord>, PipelineError> {
    let r = &env.payload;

    if r.user.trim().is_empty() {
        return Err(PipelineError::Transform("user must not be empty".to_string()));
    }

    if r.appliance.trim().is_empty() {
        return Err(PipelineError::Transform("appliance must not be empty".to_string()));
    }

    if r.status != STATUS_ON {
        return Err(PipelineError::Transform(format!("unexpected status {}", r.status)));
    }

    if !r.energy_within_band() {
        return Err(PipelineError::Transform(format!(
            "{} kWh is outside the expected band for {} ({} kW)",
            r.energy_kwh, r.appliance, r.kw_rating
        )));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct UsageRecordValidation;

#[async_trait::async_trait]
impl Transform<UsageRecord, UsageRecord> for UsageRecordValidation {
    async fn apply(
        &self,
        input: Envelope<UsageRecord>,
    ) -> Result<Envelope<UsageRecord>, PipelineError> {
        match validate_usage_record(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!(LOG_REJECTED).increment(1);
                Err(e)
            }
        }
    }
}
