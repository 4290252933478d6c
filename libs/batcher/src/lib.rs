pub mod batch;
pub mod config;
pub mod error;
pub mod metrics;
mod accumulate;
mod pipeline;
mod transmit;

pub use batch::{Batch, PACK_DELIMITER};
pub use config::{BatcherConfig, Limits};
pub use error::{BatchError, BatcherError, Rejected, TransmitError};
pub use metrics::{BatchObserver, BatcherMetrics, MetricsSnapshot, NoopObserver};
pub use pipeline::{Batcher, BatcherRunner};

pub use batch_api::{PutOutcome, Record, RecordSink, SinkError};
