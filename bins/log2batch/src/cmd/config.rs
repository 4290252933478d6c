use clap::Args;
use serde::Deserialize;

use batcher::BatcherConfig;
use sink_file::FileSinkConfig;

use super::error::Log2BatchError;

/// Input path meaning "read stdin".
pub const STDIN_PATH: &str = "-";

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

/// ```toml
/// file = "/var/log/app.log"
///
/// [batcher]
/// destination = "access-logs"
/// max_send_interval_ms = 5000
///
/// [batcher.limits]
/// batch_items = 200
///
/// [output]
/// path = "batches.log"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub file: Option<String>,
    #[serde(default)]
    pub batcher: BatcherConfig,
    pub output: Option<FileSinkConfig>,
}

pub fn load_config(path: &str) -> Result<Config, Log2BatchError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Log2BatchError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| Log2BatchError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Path to log2batch.toml
    #[arg(long, default_value = "log2batch.toml", env = "LOG2BATCH_CONFIG")]
    pub config: String,

    /// File to read records from, one per line (`-` = stdin)
    #[arg(short = 'f', long = "filename")]
    pub file: Option<String>,

    /// Where batches are written (`-` = stdout)
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Flush a batch at most this many ms after it was opened
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Keep one record per item instead of packing small records
    #[arg(long)]
    pub no_pack: bool,

    /// Delivery stream name
    #[arg(env = "LOG2BATCH_DESTINATION")]
    pub destination: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Final settings after merging: config file < env/CLI.
#[derive(Debug)]
pub struct Effective {
    pub input: String,
    pub batcher: BatcherConfig,
    pub output: FileSinkConfig,
}

impl Effective {
    pub fn new(args: &RunArgs) -> Result<Self, Log2BatchError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };
        Self::merge(args, cfg)
    }

    fn merge(args: &RunArgs, cfg: Config) -> Result<Self, Log2BatchError> {
        let mut batcher = cfg.batcher;
        if let Some(destination) = &args.destination {
            batcher.destination = destination.clone();
        }
        if batcher.destination.is_empty() {
            return Err(Log2BatchError::Config("destination stream name is required".into()));
        }
        if let Some(ms) = args.interval_ms {
            batcher.max_send_interval_ms = ms;
        }
        if args.no_pack {
            batcher.pack_records = false;
        }
        batcher
            .validate()
            .map_err(|e| Log2BatchError::Config(e.to_string()))?;

        let mut output = cfg.output.unwrap_or_default();
        if let Some(path) = &args.output {
            output.path = path.clone();
        }

        Ok(Self {
            input: args.file.clone().or(cfg.file).unwrap_or_else(|| STDIN_PATH.into()),
            batcher,
            output,
        })
    }
}
