mod config;
mod sink;

pub use config::{FileSinkConfig, STDOUT_PATH};
pub use sink::FileSink;
