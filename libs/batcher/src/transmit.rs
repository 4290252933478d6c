use std::time::Instant;

use tokio::sync::mpsc;

use batch_api::RecordSink;

use crate::batch::Batch;
use crate::metrics::BatchObserver;
use crate::BatcherError;

// ═══════════════════════════════════════════════════════════════
//  Transmission stage — send queue → sink.put_batch()
// ═══════════════════════════════════════════════════════════════

/// Send completed batches one at a time, in queue order.
///
/// Returns `Ok` once the accumulation stage has closed the queue and every
/// batch was delivered. The first failed batch ends the stage: it is not
/// retried and everything still queued is dropped with the receiver.
pub(crate) async fn transmit_batches(
    mut batches: mpsc::Receiver<Batch>,
    sink: &dyn RecordSink,
    destination: &str,
    observer: &dyn BatchObserver,
) -> Result<(), BatcherError> {
    while let Some(batch) = batches.recv().await {
        let started = Instant::now();

        if let Err(e) = batch.send(sink, destination).await {
            tracing::error!(
                %destination,
                items = batch.len(),
                bytes = batch.size(),
                error = %e,
                "send error, batch lost"
            );
            return Err(e.into());
        }

        let latency = started.elapsed();
        observer.batch_sent(batch.size(), latency);
        tracing::debug!(
            %destination,
            items = batch.len(),
            bytes = batch.size(),
            latency_ms = latency.as_millis() as u64,
            "batch sent"
        );
    }

    tracing::info!(%destination, "transmission finished");
    Ok(())
}
