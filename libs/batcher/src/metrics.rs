use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
//  Observer — side-channel reporting
// ═══════════════════════════════════════════════════════════════

/// Receives batching events. The pipeline only writes to it.
///
/// All hooks default to no-ops so an implementation can pick the
/// events it cares about.
pub trait BatchObserver: Send + Sync {
    /// A record was accepted by `submit`.
    fn bytes_read(&self, _bytes: usize) {}

    /// A record was placed into a batch (seeded, merged or appended).
    fn bytes_batched(&self, _bytes: usize) {}

    fn batch_created(&self) {}

    /// A batch was completed and handed to the transmission stage.
    fn batch_queued(&self, _size: usize, _length: usize, _fill_latency: Duration) {}

    fn batch_sent(&self, _size: usize, _send_latency: Duration) {}
}

pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

// ═══════════════════════════════════════════════════════════════
//  Atomic metrics
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, value: u64) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Count / total / max of observed values.
#[derive(Debug, Default)]
pub struct Agg {
    count: AtomicU64,
    total: AtomicU64,
    max: AtomicU64,
}

impl Agg {
    pub fn record(&self, value: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(value, Ordering::Relaxed);

        let mut prev = self.max.load(Ordering::Relaxed);
        while value > prev {
            match self
                .max
                .compare_exchange_weak(prev, value, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(next) => prev = next,
            }
        }
    }

    pub fn record_duration(&self, dur: Duration) {
        self.record(dur.as_nanos().min(u64::MAX as u128) as u64);
    }

    pub fn snapshot(&self) -> AggSnapshot {
        AggSnapshot {
            count: self.count.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            max: self.max.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggSnapshot {
    pub count: u64,
    pub total: u64,
    pub max: u64,
}

impl AggSnapshot {
    pub fn avg(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total / self.count
        }
    }
}

/// Process-wide batching counters.
///
/// Share one instance via `Arc` between the batcher and whoever reports
/// (logs, exporters).
#[derive(Debug, Default)]
pub struct BatcherMetrics {
    pub bytes_read: Counter,
    pub bytes_batched: Counter,
    pub bytes_sent: Counter,
    pub batches_created: Counter,
    pub batches_sent: Counter,
    /// Nanoseconds from batch open to hand-off.
    pub batch_fill_latency: Agg,
    /// Nanoseconds spent in the sink call.
    pub batch_send_latency: Agg,
    pub batch_size: Agg,
    pub batch_length: Agg,
}

impl BatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_read: self.bytes_read.get(),
            bytes_batched: self.bytes_batched.get(),
            bytes_sent: self.bytes_sent.get(),
            batches_created: self.batches_created.get(),
            batches_sent: self.batches_sent.get(),
            batch_fill_latency_ns: self.batch_fill_latency.snapshot(),
            batch_send_latency_ns: self.batch_send_latency.snapshot(),
            batch_size: self.batch_size.snapshot(),
            batch_length: self.batch_length.snapshot(),
        }
    }
}

impl BatchObserver for BatcherMetrics {
    fn bytes_read(&self, bytes: usize) {
        self.bytes_read.inc_by(bytes as u64);
    }

    fn bytes_batched(&self, bytes: usize) {
        self.bytes_batched.inc_by(bytes as u64);
    }

    fn batch_created(&self) {
        self.batches_created.inc();
    }

    fn batch_queued(&self, size: usize, length: usize, fill_latency: Duration) {
        self.batch_size.record(size as u64);
        self.batch_length.record(length as u64);
        self.batch_fill_latency.record_duration(fill_latency);
    }

    fn batch_sent(&self, size: usize, send_latency: Duration) {
        self.bytes_sent.inc_by(size as u64);
        self.batches_sent.inc();
        self.batch_send_latency.record_duration(send_latency);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub bytes_read: u64,
    pub bytes_batched: u64,
    pub bytes_sent: u64,
    pub batches_created: u64,
    pub batches_sent: u64,
    pub batch_fill_latency_ns: AggSnapshot,
    pub batch_send_latency_ns: AggSnapshot,
    pub batch_size: AggSnapshot,
    pub batch_length: AggSnapshot,
}
