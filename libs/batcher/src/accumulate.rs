use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use batch_api::Record;

use crate::batch::Batch;
use crate::config::Limits;
use crate::metrics::BatchObserver;
use crate::BatcherError;

// ═══════════════════════════════════════════════════════════════
//  Accumulation stage — input queue → Batch → send queue
// ═══════════════════════════════════════════════════════════════

/// Sole writer of batch contents.
///
/// A batch is flushed when it reaches `limits.batch_items`, when the next
/// record overflows it, when `max_send_interval` has elapsed since it was
/// opened, or when the input closes.
pub(crate) struct Accumulator {
    pub(crate) input: mpsc::Receiver<Record>,
    pub(crate) output: mpsc::Sender<Batch>,
    pub(crate) limits: Limits,
    pub(crate) pack: bool,
    pub(crate) max_send_interval: Duration,
    pub(crate) destination: String,
    pub(crate) observer: Arc<dyn BatchObserver>,
}

impl Accumulator {
    /// Run until the input is closed and drained.
    ///
    /// Dropping `self.output` on return tells the transmission stage no
    /// more batches are coming. Returns early, without error, if the
    /// transmission stage has gone away.
    pub(crate) async fn run(self) -> Result<(), BatcherError> {
        let Accumulator {
            mut input,
            output,
            limits,
            pack,
            max_send_interval,
            destination,
            observer,
        } = self;

        while let Some(seed) = input.recv().await {
            let mut batch = open_batch(seed, limits, &*observer);

            while !batch.is_full() {
                let deadline = batch.opened_at() + max_send_interval;
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::trace!(%destination, items = batch.len(), "send interval elapsed");
                        break;
                    }
                    record = input.recv() => {
                        let Some(record) = record else {
                            // Input closed: last batch goes out, then we are done.
                            flush(&output, batch, &destination, &*observer).await;
                            tracing::debug!(%destination, "input closed, accumulation finished");
                            return Ok(());
                        };

                        let len = record.len();
                        match batch.add(record, pack) {
                            Ok(()) => observer.bytes_batched(len),
                            Err(rejected) if rejected.is_overflow() => {
                                tracing::trace!(%destination, reason = %rejected.kind, "batch full");
                                // Flush before reseeding: the hand-off may wait on a slow
                                // sink, and the next deadline starts at open.
                                if !flush(&output, batch, &destination, &*observer).await {
                                    return Ok(());
                                }
                                batch = open_batch(rejected.record, limits, &*observer);
                            }
                            Err(rejected) => {
                                tracing::error!(%destination, error = %rejected, "unexpected batch error");
                                return Err(BatcherError::InvariantViolation(format!(
                                    "batch refused a {len} byte record: {}",
                                    rejected.kind
                                )));
                            }
                        }
                    }
                }
            }

            if !flush(&output, batch, &destination, &*observer).await {
                return Ok(());
            }
        }

        tracing::debug!(%destination, "input closed, accumulation finished");
        Ok(())
    }
}

fn open_batch(seed: Record, limits: Limits, observer: &dyn BatchObserver) -> Batch {
    let len = seed.len();
    let batch = Batch::new(seed, limits);
    observer.batch_created();
    observer.bytes_batched(len);
    batch
}

/// Hand a completed batch to the transmission stage.
///
/// Waits while the send queue is full. Returns `false` if the
/// transmission stage has stopped; the batch is dropped in that case.
async fn flush(
    output: &mpsc::Sender<Batch>,
    batch: Batch,
    destination: &str,
    observer: &dyn BatchObserver,
) -> bool {
    let (size, length) = (batch.size(), batch.len());
    observer.batch_queued(size, length, batch.fill_latency());
    tracing::debug!(%destination, items = length, bytes = size, "batch ready");

    if output.send(batch).await.is_err() {
        tracing::warn!(%destination, items = length, bytes = size, "transmission stopped, dropping batch");
        return false;
    }
    true
}
