use std::time::Duration;

use serde::Deserialize;

use crate::BatcherError;

// ═══════════════════════════════════════════════════════════════
//  Limits
// ═══════════════════════════════════════════════════════════════

/// Max bytes in a single delivered item (Firehose: 1000 KiB).
pub const DEFAULT_ITEM_SIZE: usize = 1000 * 1024;
/// Max bytes across all items of one batch (Firehose: 4 MiB).
pub const DEFAULT_BATCH_SIZE: usize = 4 * 1024 * 1024;
/// Max items per bulk-put call (Firehose: 500).
pub const DEFAULT_BATCH_ITEMS: usize = 500;

/// Capacity ceilings of the downstream stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub item_size: usize,
    pub batch_size: usize,
    pub batch_items: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            item_size: DEFAULT_ITEM_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_items: DEFAULT_BATCH_ITEMS,
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<(), String> {
        if self.item_size == 0 || self.batch_size == 0 || self.batch_items == 0 {
            return Err(format!("limits must be non-zero: {self:?}"));
        }
        if self.item_size > self.batch_size {
            return Err(format!(
                "item_size ({}) cannot exceed batch_size ({})",
                self.item_size, self.batch_size
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Batcher Config
// ═══════════════════════════════════════════════════════════════

/// Pipeline configuration. Immutable once the batcher is built.
///
/// Deserializes from a partial TOML table; `destination` may be left out
/// and filled in later, `validate` refuses it empty.
#[derive(Debug, Clone, Deserialize)]
pub struct BatcherConfig {
    /// Delivery stream name passed to every bulk-put.
    #[serde(default)]
    pub destination: String,
    /// A batch is flushed at most this long after it was opened.
    #[serde(default = "default_max_send_interval_ms")]
    pub max_send_interval_ms: u64,
    #[serde(default)]
    pub limits: Limits,
    /// Merge small records into the last item, newline-delimited.
    #[serde(default = "default_pack_records")]
    pub pack_records: bool,
    /// Input queue depth. Defaults to `limits.batch_items`.
    #[serde(default)]
    pub input_buffer: Option<usize>,
    /// Completed batches waiting for the transmission stage.
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
}

fn default_max_send_interval_ms() -> u64 {
    60_000
}
fn default_pack_records() -> bool {
    true
}
fn default_send_buffer() -> usize {
    1
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl BatcherConfig {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            max_send_interval_ms: default_max_send_interval_ms(),
            limits: Limits::default(),
            pack_records: default_pack_records(),
            input_buffer: None,
            send_buffer: default_send_buffer(),
        }
    }

    pub fn with_max_send_interval(mut self, interval: Duration) -> Self {
        self.max_send_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_packing(mut self, pack_records: bool) -> Self {
        self.pack_records = pack_records;
        self
    }

    pub fn max_send_interval(&self) -> Duration {
        Duration::from_millis(self.max_send_interval_ms)
    }

    pub fn input_buffer(&self) -> usize {
        self.input_buffer.unwrap_or(self.limits.batch_items)
    }

    pub fn validate(&self) -> Result<(), BatcherError> {
        if self.destination.is_empty() {
            return Err(BatcherError::Config("destination must not be empty".into()));
        }
        if self.max_send_interval_ms == 0 {
            return Err(BatcherError::Config("max_send_interval_ms must be positive".into()));
        }
        if self.input_buffer() == 0 || self.send_buffer == 0 {
            return Err(BatcherError::Config("queue buffers must be positive".into()));
        }
        self.limits.validate().map_err(BatcherError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_firehose_limits() {
        let cfg = BatcherConfig::new("logs");
        assert_eq!(cfg.limits.item_size, 1_024_000);
        assert_eq!(cfg.limits.batch_size, 4_194_304);
        assert_eq!(cfg.limits.batch_items, 500);
        assert_eq!(cfg.max_send_interval(), Duration::from_secs(60));
        assert_eq!(cfg.input_buffer(), 500);
        assert_eq!(cfg.send_buffer, 1);
        assert!(cfg.pack_records);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: BatcherConfig = toml::from_str(
            r#"
            destination = "access-logs"
            max_send_interval_ms = 250
            pack_records = false

            [limits]
            batch_items = 10
            "#,
        )
        .unwrap();

        assert_eq!(cfg.destination, "access-logs");
        assert_eq!(cfg.max_send_interval(), Duration::from_millis(250));
        assert!(!cfg.pack_records);
        assert_eq!(cfg.limits.batch_items, 10);
        assert_eq!(cfg.limits.item_size, DEFAULT_ITEM_SIZE);
        assert_eq!(cfg.input_buffer(), 10);
    }

    #[test]
    fn rejects_inconsistent_limits() {
        let cfg = BatcherConfig::new("logs").with_limits(Limits {
            item_size: 64,
            batch_size: 32,
            batch_items: 4,
        });
        assert!(matches!(cfg.validate(), Err(BatcherError::Config(_))));

        let cfg = BatcherConfig::new("logs").with_limits(Limits {
            batch_items: 0,
            ..Limits::default()
        });
        assert!(matches!(cfg.validate(), Err(BatcherError::Config(_))));
    }

    #[test]
    fn rejects_empty_destination_and_zero_interval() {
        assert!(BatcherConfig::new("").validate().is_err());
        let cfg = BatcherConfig::new("logs").with_max_send_interval(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_destination_parses_but_does_not_validate() {
        let cfg: BatcherConfig = toml::from_str("pack_records = true").unwrap();
        assert!(cfg.destination.is_empty());
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.to_string(), "config: destination must not be empty");
    }
}
