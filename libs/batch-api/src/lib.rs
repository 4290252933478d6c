pub mod error;

use std::future::Future;
use std::pin::Pin;

pub use error::{ErrorKind, SinkError};

// ════════════════════════════════════════════════════════════════
//  Records
// ════════════════════════════════════════════════════════════════

/// Opaque byte payload. The batcher only ever looks at its length.
pub type Record = Vec<u8>;

// ════════════════════════════════════════════════════════════════
//  Sink contract
// ════════════════════════════════════════════════════════════════

/// Result of an accepted bulk-put call.
///
/// A delivery stream may accept the call but still refuse individual
/// items; `failed` counts those.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOutcome {
    pub failed: usize,
}

impl PutOutcome {
    pub fn accepted() -> Self {
        Self { failed: 0 }
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Batch-oriented delivery stream (Firehose-like).
///
/// Implementations perform one bulk-put per call. The items slice is in
/// delivery order and is already within the stream's limits.
pub trait RecordSink: Send + Sync {
    /// Put all items into `destination` in one call.
    ///
    /// `Err` = the call itself failed. `Ok` with a non-zero
    /// `PutOutcome::failed` = the call was accepted but some items were not.
    fn put_batch<'a>(
        &'a self,
        destination: &'a str,
        items: &'a [Record],
    ) -> Pin<Box<dyn Future<Output = Result<PutOutcome, SinkError>> + Send + 'a>>;
}
