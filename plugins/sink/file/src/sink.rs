use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use batch_api::{PutOutcome, Record, RecordSink, SinkError};

use super::config::FileSinkConfig;

// ════════════════════════════════════════════════════════════════
//  FileSink
// ════════════════════════════════════════════════════════════════

type Output = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// Writes every item of a batch as one newline-terminated line.
///
/// Packed items already contain newlines, so the output reads as the
/// submitted record stream. The writer is flushed after each batch.
pub struct FileSink {
    out: Mutex<Output>,
    separate_batches: bool,
}

impl FileSink {
    pub async fn open(cfg: &FileSinkConfig) -> Result<Self, SinkError> {
        let writer: Box<dyn AsyncWrite + Send + Unpin> = if cfg.is_stdout() {
            Box::new(tokio::io::stdout())
        } else {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&cfg.path)
                .await
                .map_err(|e| SinkError::config(format!("open '{}': {e}", cfg.path)))?;
            Box::new(file)
        };

        tracing::info!(path = %cfg.path, separate_batches = cfg.separate_batches, "file sink opened");
        Ok(Self {
            out: Mutex::new(BufWriter::new(writer)),
            separate_batches: cfg.separate_batches,
        })
    }

    async fn write_batch(&self, items: &[Record]) -> Result<(), SinkError> {
        let mut out = self.out.lock().await;
        for item in items {
            out.write_all(item).await?;
            out.write_all(b"\n").await?;
        }
        if self.separate_batches {
            out.write_all(b"\n").await?;
        }
        out.flush().await?;
        Ok(())
    }
}

impl RecordSink for FileSink {
    fn put_batch<'a>(
        &'a self,
        destination: &'a str,
        items: &'a [Record],
    ) -> Pin<Box<dyn Future<Output = Result<PutOutcome, SinkError>> + Send + 'a>> {
        Box::pin(async move {
            self.write_batch(items)
                .await
                .map_err(|e| e.with_context(destination))?;
            tracing::trace!(%destination, items = items.len(), "batch written");
            Ok(PutOutcome::accepted())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(path: &std::path::Path, separate_batches: bool) -> FileSinkConfig {
        FileSinkConfig {
            path: path.to_string_lossy().into_owned(),
            separate_batches,
        }
    }

    #[tokio::test]
    async fn writes_items_as_lines_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = FileSink::open(&config_for(&path, false)).await.unwrap();

        let first = vec![b"one\ntwo".to_vec(), b"three".to_vec()];
        let outcome = sink.put_batch("logs", &first).await.unwrap();
        assert!(outcome.is_complete());
        sink.put_batch("logs", &[b"four".to_vec()]).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "one\ntwo\nthree\nfour\n");
    }

    #[tokio::test]
    async fn separates_batches_with_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = FileSink::open(&config_for(&path, true)).await.unwrap();

        sink.put_batch("logs", &[b"a".to_vec()]).await.unwrap();
        sink.put_batch("logs", &[b"b".to_vec(), b"c".to_vec()]).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "a\n\nb\nc\n\n");
    }

    #[tokio::test]
    async fn missing_directory_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let err = FileSink::open(&config_for(&path, false)).await.err().unwrap();
        assert_eq!(err.kind(), batch_api::ErrorKind::Config);
    }
}
