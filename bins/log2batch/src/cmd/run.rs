use std::sync::Arc;

use batcher::{Batcher, BatcherMetrics, MetricsSnapshot};
use sink_file::FileSink;

use super::config::Effective;
use super::error::Log2BatchError;
use super::lines::{open_input, spawn_line_splitter};

// ═══════════════════════════════════════════════════════════════
//  Main dispatch: input lines → batcher → file sink
// ═══════════════════════════════════════════════════════════════

pub async fn run(eff: Effective) -> Result<(), Log2BatchError> {
    let sink = Arc::new(FileSink::open(&eff.output).await?);
    let metrics = Arc::new(BatcherMetrics::new());

    let (batcher, runner) = Batcher::with_observer(sink, eff.batcher, metrics.clone())?;
    let sending = tokio::spawn(runner.start());

    let source = open_input(&eff.input).await?;
    tracing::info!(input = %eff.input, output = %eff.output.path, "reading records");
    let (lines, reader) = spawn_line_splitter(source, 1);

    let submitted = batcher.submit_from(lines).await;
    batcher.close();

    match submitted {
        Ok(()) => match reader.await? {
            Ok(count) => tracing::info!(lines = count, "input finished"),
            Err(e) => tracing::error!(error = %e, "line reader failed"),
        },
        Err(e) => {
            tracing::error!(error = %e, "adding lines failed");
            reader.abort();
        }
    }

    let sent = sending.await?;
    log_metrics(&metrics.snapshot());
    sent?;
    Ok(())
}

fn log_metrics(m: &MetricsSnapshot) {
    tracing::info!(
        bytes_read = m.bytes_read,
        bytes_batched = m.bytes_batched,
        bytes_sent = m.bytes_sent,
        batches_created = m.batches_created,
        batches_sent = m.batches_sent,
        avg_batch_items = m.batch_length.avg(),
        avg_batch_bytes = m.batch_size.avg(),
        avg_fill_ms = m.batch_fill_latency_ns.avg() / 1_000_000,
        max_send_ms = m.batch_send_latency_ns.max / 1_000_000,
        "batcher finished"
    );
}
