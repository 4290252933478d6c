use std::sync::Arc;

use tokio::sync::mpsc;

use batch_api::{Record, RecordSink};

use crate::accumulate::Accumulator;
use crate::config::BatcherConfig;
use crate::metrics::{BatchObserver, NoopObserver};
use crate::transmit::transmit_batches;
use crate::BatcherError;

// ═══════════════════════════════════════════════════════════════
//  Batcher — producer handle
// ═══════════════════════════════════════════════════════════════

/// Submission side of the pipeline. Cheap to clone.
///
/// The input queue closes once every handle is dropped; the stages then
/// flush what they hold and `BatcherRunner::start` returns.
#[derive(Clone)]
pub struct Batcher {
    input: mpsc::Sender<Record>,
    item_size: usize,
    observer: Arc<dyn BatchObserver>,
}

/// Owns the stages. Consumed by `start`.
pub struct BatcherRunner {
    config: BatcherConfig,
    sink: Arc<dyn RecordSink>,
    input: mpsc::Receiver<Record>,
    observer: Arc<dyn BatchObserver>,
}

impl Batcher {
    /// Build a batcher delivering to `sink`, without metrics.
    pub fn new(
        sink: Arc<dyn RecordSink>,
        config: BatcherConfig,
    ) -> Result<(Batcher, BatcherRunner), BatcherError> {
        Self::with_observer(sink, config, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        sink: Arc<dyn RecordSink>,
        config: BatcherConfig,
        observer: Arc<dyn BatchObserver>,
    ) -> Result<(Batcher, BatcherRunner), BatcherError> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.input_buffer());
        let batcher = Batcher {
            input: tx,
            item_size: config.limits.item_size,
            observer: observer.clone(),
        };
        let runner = BatcherRunner {
            config,
            sink,
            input: rx,
            observer,
        };
        Ok((batcher, runner))
    }

    /// Queue one record, waiting while the input queue is full.
    ///
    /// Records larger than the item limit are refused before they reach
    /// the queue.
    pub async fn submit(&self, record: Record) -> Result<(), BatcherError> {
        let len = record.len();
        if len > self.item_size {
            return Err(BatcherError::ItemTooLarge { len, limit: self.item_size });
        }

        self.input.send(record).await.map_err(|_| BatcherError::Closed)?;
        self.observer.bytes_read(len);
        Ok(())
    }

    /// Submit every record of `records`, stopping at the first error.
    pub async fn submit_all<I>(&self, records: I) -> Result<(), BatcherError>
    where
        I: IntoIterator<Item = Record>,
    {
        for record in records {
            self.submit(record).await?;
        }
        Ok(())
    }

    /// Drain `rx` into the batcher until it closes or a submission fails.
    pub async fn submit_from(&self, mut rx: mpsc::Receiver<Record>) -> Result<(), BatcherError> {
        while let Some(record) = rx.recv().await {
            self.submit(record).await?;
        }
        Ok(())
    }

    /// `true` once the pipeline no longer accepts records.
    pub fn is_closed(&self) -> bool {
        self.input.is_closed()
    }

    /// Drop this handle. The input closes when the last handle is gone.
    pub fn close(self) {}
}

impl BatcherRunner {
    /// Run both stages until the input is closed and drained.
    ///
    /// The accumulation stage is spawned on the current tokio runtime; the
    /// transmission stage runs on the caller's task. A transmission error
    /// is terminal: it is returned and the accumulation stage is torn
    /// down, after which `Batcher::submit` reports `Closed`.
    pub async fn start(self) -> Result<(), BatcherError> {
        let BatcherRunner { config, sink, input, observer } = self;
        let destination = config.destination.clone();

        let (batch_tx, batch_rx) = mpsc::channel(config.send_buffer);
        let accumulator = Accumulator {
            input,
            output: batch_tx,
            limits: config.limits,
            pack: config.pack_records,
            max_send_interval: config.max_send_interval(),
            destination: destination.clone(),
            observer: observer.clone(),
        };

        tracing::info!(
            %destination,
            item_size = config.limits.item_size,
            batch_size = config.limits.batch_size,
            batch_items = config.limits.batch_items,
            max_send_interval_ms = config.max_send_interval_ms,
            pack_records = config.pack_records,
            "batcher started"
        );

        let accumulation = tokio::spawn(accumulator.run());

        if let Err(e) = transmit_batches(batch_rx, &*sink, &destination, &*observer).await {
            accumulation.abort();
            // Wait for the abort so the input queue is closed before returning.
            let _ = accumulation.await;
            return Err(e);
        }

        match accumulation.await {
            Ok(result) => result,
            Err(e) => Err(BatcherError::InvariantViolation(format!("accumulation task failed: {e}"))),
        }
    }
}
