// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

/// Path meaning "write to stdout".
pub const STDOUT_PATH: &str = "-";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileSinkConfig {
    /// Output file, appended to and created if missing. `-` = stdout.
    #[serde(default = "default_path")]
    pub path: String,
    /// Write an empty line after every batch.
    #[serde(default)]
    pub separate_batches: bool,
}

fn default_path() -> String {
    STDOUT_PATH.into()
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            separate_batches: false,
        }
    }
}

impl FileSinkConfig {
    pub fn is_stdout(&self) -> bool {
        self.path == STDOUT_PATH
    }
}
