use std::{collections::HashSet, path::PathBuf, sync::Arc};

use energy_client::{Catalog, UsageRecord, UserName};
use rand::Rng;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
    metrics_server::LOG_REJECTED,
    pipeline::{Pipeline, PipelineError},
    sinks::CsvFileSink,
    sources::{ApplianceSelectionSource, UnknownAppliance},
    transform::UsageRecordValidation,
};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter your name before logging")]
    EmptyUserName,
    #[error("please select at least one appliance")]
    NoAppliancesSelected,
}

#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown appliance: {0}")]
    UnknownAppliance(String),
    #[error("usage record rejected: {0}")]
    Rejected(String),
    #[error("failed to append to usage store: {0}")]
    Store(#[source] std::io::Error),
}

impl From<UnknownAppliance> for LogError {
    fn from(e: UnknownAppliance) -> Self {
        Self::UnknownAppliance(e.0)
    }
}

impl From<PipelineError> for LogError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Transform(msg) => Self::Rejected(msg),
            PipelineError::Sink(io) => Self::Store(io),
        }
    }
}

/// Appends one logging action to the usage store.
#[derive(Clone)]
pub struct UsageRecorder {
    catalog: Arc<Catalog>,
    store_path: PathBuf,
}

impl UsageRecorder {
    pub fn new<P: Into<PathBuf>>(catalog: Arc<Catalog>, store_path: P) -> Self {
        Self {
            catalog,
            store_path: store_path.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Log `appliances` as ON for `user`, stamped with the current time.
    ///
    /// Returns the rows that were written.
    pub async fn record<A: AsRef<str>>(
        &self,
        user: &str,
        appliances: &[A],
    ) -> Result<Vec<UsageRecord>, LogError> {
        let source = self.prepare(user, appliances, now_timestamp(), &mut rand::thread_rng())?;
        self.commit(source).await
    }

    /// Same as [`record`](Self::record) with an explicit clock and rng.
    pub async fn record_at<A, R>(
        &self,
        user: &str,
        appliances: &[A],
        timestamp: PrimitiveDateTime,
        rng: &mut R,
    ) -> Result<Vec<UsageRecord>, LogError>
    where
        A: AsRef<str>,
        R: Rng + ?Sized,
    {
        let source = self.prepare(user, appliances, timestamp, rng)?;
        self.commit(source).await
    }

    fn prepare<A, R>(
        &self,
        user: &str,
        appliances: &[A],
        timestamp: PrimitiveDateTime,
        rng: &mut R,
    ) -> Result<ApplianceSelectionSource, LogError>
    where
        A: AsRef<str>,
        R: Rng + ?Sized,
    {
        let selection = distinct_in_order(appliances);
        let prepared = validate_request(user, &selection).and_then(|user| {
            ApplianceSelectionSource::new(&self.catalog, &user, &selection, timestamp, rng)
                .map_err(LogError::from)
        });

        if let Err(e) = &prepared {
            metrics::counter!(LOG_REJECTED).increment(1);
            tracing::warn!(error = %e, "usage log request rejected");
        }
        prepared
    }

    async fn commit(&self, source: ApplianceSelectionSource) -> Result<Vec<UsageRecord>, LogError> {
        let pipeline: Pipeline<_, UsageRecord, _> = Pipeline {
            source,
            transforms: vec![Arc::new(UsageRecordValidation)],
            sink: CsvFileSink::new(&self.store_path),
        };

        let written = pipeline.run().await?;
        if let Some(first) = written.first() {
            tracing::info!(
                user = %first.user,
                rows = written.len(),
                path = %self.store_path.display(),
                "usage logged"
            );
        }
        Ok(written)
    }
}

/// The selection is a set: repeats collapse onto the first occurrence.
fn distinct_in_order<A: AsRef<str>>(appliances: &[A]) -> Vec<&str> {
    let mut seen = HashSet::new();
    appliances
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .collect()
}

fn validate_request<A: AsRef<str>>(user: &str, appliances: &[A]) -> Result<UserName, LogError> {
    let user = UserName::parse(user).ok_or(ValidationError::EmptyUserName)?;
    if appliances.is_empty() {
        return Err(ValidationError::NoAppliancesSelected.into());
    }
    Ok(user)
}

/// Current wall-clock time at second precision, local when the offset is known.
pub fn now_timestamp() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let now = now.replace_nanosecond(0).unwrap_or(now);
    PrimitiveDateTime::new(now.date(), now.time())
}
