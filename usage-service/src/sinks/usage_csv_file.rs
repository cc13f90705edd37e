use std::{io, path::PathBuf};

use energy_client::{domain::usage_record::STORE_COLUMNS, UsageRecord};
use futures::StreamExt;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::{
    metrics_server::RECORDS_LOGGED,
    pipeline::{Envelope, PipelineError, Sink},
};

/// Appends usage records to the CSV store.
///
/// The whole batch is buffered first: if any upstream item failed, nothing is
/// written. Otherwise the rows go out in a single write, preceded by the
/// header when the store is new or empty. No locking is attempted.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    async fn needs_header(&self) -> io::Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn append(&self, batch: &[Envelope<UsageRecord>]) -> Result<(), PipelineError> {
        let header = self.needs_header().await?;
        let buf = encode_rows(batch, header)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;

        Ok(())
    }
}

/// CSV bytes for `batch`, optionally led by the canonical header.
pub fn encode_rows(batch: &[Envelope<UsageRecord>], header: bool) -> Result<Vec<u8>, PipelineError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if header {
        wtr.write_record(STORE_COLUMNS).map_err(csv_to_io)?;
    }

    for env in batch {
        let fields = env
            .payload
            .to_fields()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        wtr.write_record(&fields).map_err(csv_to_io)?;
    }

    wtr.into_inner()
        .map_err(|e| PipelineError::Sink(e.into_error()))
}

fn csv_to_io(e: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[async_trait::async_trait]
impl Sink<UsageRecord> for CsvFileSink {
    type Output = Vec<UsageRecord>;

    async fn run<S>(&self, mut input: S) -> Result<Vec<UsageRecord>, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<UsageRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut buffer: Vec<Envelope<UsageRecord>> = Vec::new();

        while let Some(item) = input.next().await {
            match item {
                Ok(env) => buffer.push(env),
                Err(e) => {
                    tracing::warn!(error = %e, "usage batch rejected, nothing written");
                    return Err(e);
                }
            }
        }

        if buffer.is_empty() {
            return Ok(Vec::new());
        }

        buffer.sort_by_key(|env| env.seq);
        self.append(&buffer).await.map_err(|e| {
            tracing::error!(error = %e, path = %self.path.display(), "failed to append usage rows");
            e
        })?;

        metrics::counter!(RECORDS_LOGGED).increment(buffer.len() as u64);
        Ok(buffer.into_iter().map(|env| env.payload).collect())
    }
}
