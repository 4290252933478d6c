use std::time::Duration;

use tokio::time::Instant;

use batch_api::{Record, RecordSink};

use crate::config::Limits;
use crate::error::{BatchError, Rejected, TransmitError};

/// Delimiter placed between records packed into one item.
pub const PACK_DELIMITER: u8 = b'\n';

/// Ordered set of items bound for one bulk-put call.
///
/// Tracks the running byte size and item count so the batch never
/// outgrows the stream's `Limits`. `size` counts raw record bytes;
/// delimiters added by packing are not included.
#[derive(Debug)]
pub struct Batch {
    items: Vec<Record>,
    size: usize,
    limits: Limits,
    opened_at: Instant,
}

impl Batch {
    /// Open a batch holding exactly `seed`.
    pub fn new(seed: Record, limits: Limits) -> Self {
        let mut items = Vec::with_capacity(limits.batch_items.min(crate::config::DEFAULT_BATCH_ITEMS));
        let size = seed.len();
        items.push(seed);
        Self {
            items,
            size,
            limits,
            opened_at: Instant::now(),
        }
    }

    /// Add `record`, packing it into the last item when `pack` is set and it fits.
    ///
    /// The byte ceiling is checked first, so a record that would overflow
    /// the batch is refused even if it could be packed. A failed pack falls
    /// back to appending a new item. On error the batch is unchanged and
    /// the record is returned inside `Rejected`.
    pub fn add(&mut self, record: Record, pack: bool) -> Result<(), Rejected> {
        let len = record.len();
        if len > self.limits.item_size {
            let kind = BatchError::ItemTooLarge { len, limit: self.limits.item_size };
            return Err(Rejected { kind, record });
        }
        if self.size + len > self.limits.batch_size {
            return Err(Rejected { kind: BatchError::SizeOverflow, record });
        }

        let record = if pack {
            match self.pack_into_last(record) {
                Ok(()) => {
                    self.size += len;
                    return Ok(());
                }
                Err(record) => record,
            }
        } else {
            record
        };

        if self.items.len() + 1 > self.limits.batch_items {
            return Err(Rejected { kind: BatchError::LengthOverflow, record });
        }
        self.items.push(record);
        self.size += len;
        Ok(())
    }

    /// Replace the last item with `last + '\n' + record`.
    ///
    /// The merged item must stay strictly under `item_size`, counting one
    /// delimiter byte. An empty last item gets no leading delimiter.
    fn pack_into_last(&mut self, record: Record) -> Result<(), Record> {
        let Some(last) = self.items.last_mut() else {
            return Err(record);
        };
        if last.len() + record.len() + 1 >= self.limits.item_size {
            return Err(record);
        }

        let mut merged = Vec::with_capacity(last.len() + record.len() + 1);
        merged.extend_from_slice(last);
        if !last.is_empty() {
            merged.push(PACK_DELIMITER);
        }
        merged.extend_from_slice(&record);
        *last = merged;
        Ok(())
    }

    /// Bytes accounted to this batch.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.limits.batch_items
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Record> {
        self.items
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn fill_latency(&self) -> Duration {
        self.opened_at.elapsed()
    }

    /// Bulk-put the items into `destination`.
    ///
    /// Partial rejection is reported as an error; the accepted part is
    /// not tracked and nothing is retried.
    pub async fn send(&self, sink: &dyn RecordSink, destination: &str) -> Result<(), TransmitError> {
        let outcome = sink
            .put_batch(destination, &self.items)
            .await
            .map_err(|source| TransmitError::Sink { destination: destination.to_string(), source })?;

        if !outcome.is_complete() {
            return Err(TransmitError::Rejected {
                failed: outcome.failed,
                total: self.items.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use batch_api::{PutOutcome, SinkError};

    use super::*;
    use crate::config::DEFAULT_ITEM_SIZE;

    fn small_limits() -> Limits {
        Limits { item_size: 16, batch_size: 40, batch_items: 4 }
    }

    fn newlines(item: &[u8]) -> usize {
        item.iter().filter(|b| **b == PACK_DELIMITER).count()
    }

    #[test]
    fn packs_into_seed_then_spills_to_new_item() {
        let mut batch = Batch::new(Vec::new(), Limits::default());
        let half = vec![b'A'; DEFAULT_ITEM_SIZE / 2];

        batch.add(half.clone(), true).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(newlines(&batch.items()[0]), 0);
        assert!(batch.items()[0].len() < DEFAULT_ITEM_SIZE);

        batch.add(half, true).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(newlines(&batch.items()[0]), 0);

        batch.add(b"something".to_vec(), true).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(newlines(&batch.items()[1]), 1);
        assert!(batch.items()[1].ends_with(b"\nsomething"));
        assert_eq!(batch.size(), DEFAULT_ITEM_SIZE + 9);
    }

    #[test]
    fn packed_item_stays_strictly_under_item_size() {
        let mut batch = Batch::new(b"0123456".to_vec(), small_limits());

        // 7 + 7 + 1 == 15 < 16: packs.
        batch.add(b"abcdefg".to_vec(), true).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.items()[0], b"0123456\nabcdefg");

        // 15 + 0 + 1 == 16: does not pack.
        batch.add(Vec::new(), true).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.items().iter().all(|item| item.len() < 16));
    }

    #[test]
    fn size_is_checked_before_packing() {
        let limits = Limits { item_size: 16, batch_size: 10, batch_items: 4 };
        let mut batch = Batch::new(b"abcd".to_vec(), limits);
        batch.add(b"ef".to_vec(), true).unwrap();

        // Would fit in the last item, but pushes the batch past 10 bytes.
        let err = batch.add(b"ghijk".to_vec(), true).unwrap_err();
        assert_eq!(err.kind, BatchError::SizeOverflow);
        assert_eq!(err.record, b"ghijk");
        assert_eq!(batch.size(), 6);
        assert_eq!(batch.items(), [b"abcd\nef".to_vec()]);
    }

    #[test]
    fn length_overflow_leaves_batch_untouched() {
        let mut batch = Batch::new(b"a".to_vec(), small_limits());
        for r in [b"b", b"c", b"d"] {
            batch.add(r.to_vec(), false).unwrap();
        }
        assert!(batch.is_full());

        let before: Vec<Record> = batch.items().to_vec();
        let err = batch.add(b"e".to_vec(), false).unwrap_err();
        assert_eq!(err.kind, BatchError::LengthOverflow);
        assert_eq!(err.record, b"e");
        assert_eq!(batch.items(), before.as_slice());
        assert_eq!(batch.size(), 4);

        // Packing still has room in the last item.
        batch.add(b"e".to_vec(), true).unwrap();
        assert_eq!(batch.items()[3], b"d\ne");
    }

    #[test]
    fn rejects_records_larger_than_an_item() {
        let mut batch = Batch::new(Vec::new(), small_limits());
        let err = batch.add(vec![0; 17], false).unwrap_err();
        assert_eq!(err.kind, BatchError::ItemTooLarge { len: 17, limit: 16 });
        assert!(!err.is_overflow());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.size(), 0);
    }

    #[test]
    fn limits_hold_for_any_sequence_of_adds() {
        let limits = small_limits();
        let mut batch = Batch::new(b"seed".to_vec(), limits);
        for i in 0..64usize {
            let record = vec![b'x'; i % 9];
            let _ = batch.add(record, i % 3 != 0);
            assert!(batch.size() <= limits.batch_size);
            assert!(batch.len() <= limits.batch_items);
            assert!(batch.items().iter().skip(1).all(|item| item.len() < limits.item_size));
        }
    }

    #[test]
    fn unpacked_items_keep_insertion_order() {
        let limits = Limits { item_size: 16, batch_size: 1024, batch_items: 100 };
        let records: Vec<Record> = (0..20).map(|i| format!("r{i}").into_bytes()).collect();
        let mut batch = Batch::new(records[0].clone(), limits);
        for r in &records[1..] {
            batch.add(r.clone(), false).unwrap();
        }
        assert_eq!(batch.into_items(), records);
    }

    struct OutcomeSink(Result<PutOutcome, SinkError>);

    impl RecordSink for OutcomeSink {
        fn put_batch<'a>(
            &'a self,
            _destination: &'a str,
            _items: &'a [Record],
        ) -> Pin<Box<dyn Future<Output = Result<PutOutcome, SinkError>> + Send + 'a>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn send_reports_call_errors_and_partial_rejections() {
        let mut batch = Batch::new(b"a".to_vec(), small_limits());
        batch.add(b"b".to_vec(), false).unwrap();

        let ok = OutcomeSink(Ok(PutOutcome::accepted()));
        assert!(batch.send(&ok, "logs").await.is_ok());

        let partial = OutcomeSink(Ok(PutOutcome { failed: 1 }));
        let err = batch.send(&partial, "logs").await.unwrap_err();
        assert!(matches!(err, TransmitError::Rejected { failed: 1, total: 2 }));

        let broken = OutcomeSink(Err(SinkError::io("connection reset")));
        let err = batch.send(&broken, "logs").await.unwrap_err();
        assert_eq!(err.to_string(), "sink (logs): connection reset");
    }
}
