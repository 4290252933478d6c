use batch_api::SinkError;
use batcher::BatcherError;

#[derive(Debug, thiserror::Error)]
pub enum Log2BatchError {
    #[error("{0}")]
    Config(String),

    #[error("input '{path}': {source}")]
    Input { path: String, source: std::io::Error },

    #[error("sink: {0}")]
    Sink(#[from] SinkError),

    #[error("batch sending exited early: {0}")]
    Batcher(#[from] BatcherError),

    #[error("task: {0}")]
    Task(#[from] tokio::task::JoinError),
}
