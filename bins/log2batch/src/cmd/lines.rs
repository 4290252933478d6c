use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use batch_api::Record;

use super::config::STDIN_PATH;
use super::error::Log2BatchError;

const READ_BUFFER: usize = 4 * 1024 * 1024;

pub type Source = Box<dyn AsyncRead + Send + Unpin>;

/// Open `path` for reading, `-` meaning stdin.
pub async fn open_input(path: &str) -> Result<Source, Log2BatchError> {
    if path == STDIN_PATH {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| Log2BatchError::Input { path: path.to_string(), source })?;
    Ok(Box::new(file))
}

/// Split `source` into lines on a background task.
///
/// Each line is sent without its `\n` / `\r\n` terminator. The task ends
/// at EOF or when the receiver is dropped and yields the number of lines
/// sent.
pub fn spawn_line_splitter(
    source: Source,
    buffer: usize,
) -> (mpsc::Receiver<Record>, JoinHandle<std::io::Result<u64>>) {
    let (tx, rx) = mpsc::channel(buffer);
    let handle = tokio::spawn(async move {
        let mut reader = BufReader::with_capacity(READ_BUFFER, source);
        let mut sent = 0u64;
        loop {
            let mut line = Vec::new();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            strip_line_ending(&mut line);
            if tx.send(line).await.is_err() {
                tracing::debug!("batcher stopped accepting lines");
                break;
            }
            sent += 1;
        }
        Ok(sent)
    });
    (rx, handle)
}

fn strip_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_lines_and_strips_terminators() {
        let input: &'static [u8] = b"first\r\nsecond\n\nlast without newline";
        let (mut rx, handle) = spawn_line_splitter(Box::new(input), 1);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }

        assert_eq!(
            lines,
            vec![
                b"first".to_vec(),
                b"second".to_vec(),
                Vec::new(),
                b"last without newline".to_vec(),
            ]
        );
        assert_eq!(handle.await.unwrap().unwrap(), 4);
    }

    #[test]
    fn bare_carriage_return_is_kept() {
        let mut line = b"a\rb\r".to_vec();
        strip_line_ending(&mut line);
        assert_eq!(line, b"a\rb\r");
    }

    #[tokio::test]
    async fn missing_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.log");
        let err = open_input(&path.to_string_lossy()).await.err().unwrap();
        assert!(matches!(err, Log2BatchError::Input { .. }));
    }
}
