pub mod config;
pub mod dashboard;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod recorder;
pub mod shell;
pub mod sinks;
pub mod sources;
pub mod transform;
pub mod views;

pub use pipeline::{Envelope, Pipeline};
pub use recorder::{LogError, UsageRecorder};
