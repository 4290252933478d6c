use batch_api::{Record, SinkError};

/// Why a record could not be added to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// Adding the record would push the batch past its byte ceiling.
    #[error("batch size overflow")]
    SizeOverflow,

    /// Appending the record as a new item would exceed the item ceiling.
    #[error("batch length overflow")]
    LengthOverflow,

    /// The record alone is larger than a single item may be.
    #[error("item of {len} bytes exceeds the {limit} byte item limit")]
    ItemTooLarge { len: usize, limit: usize },
}

/// A record refused by `Batch::add`, handed back to the caller untouched.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Rejected {
    pub kind: BatchError,
    pub record: Record,
}

impl Rejected {
    /// `true` for the two capacity overflows the accumulator recovers from.
    pub fn is_overflow(&self) -> bool {
        matches!(self.kind, BatchError::SizeOverflow | BatchError::LengthOverflow)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    #[error("sink ({destination}): {source}")]
    Sink { destination: String, source: SinkError },

    #[error("failed to send the full batch ({failed} of {total} failed), retries not handled")]
    Rejected { failed: usize, total: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum BatcherError {
    /// Submission-time rejection; the record never reached the queue.
    #[error("item exceeds max item size ({len} > {limit} bytes)")]
    ItemTooLarge { len: usize, limit: usize },

    /// The sink failed or refused part of a batch. Terminal for the pipeline.
    #[error("error sending batch: {0}")]
    Transmission(#[from] TransmitError),

    /// An internal contract was broken. Indicates a bug in the batcher.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("batcher is closed")]
    Closed,

    #[error("config: {0}")]
    Config(String),
}
