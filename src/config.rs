use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Time-table sidecar: reads one JSON request per line on stdin and writes one
/// JSON reply per line on stdout. Logs go to stderr (filter with RUST_LOG).
#[derive(Debug, Clone, Parser)]
#[command(name = "timetabled", version, long_about = None)]
pub struct Config {
    /// Workspace directory to open at start-up (same as `workspace.select`).
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Base URL of the school backend REST API.
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Bearer token sent with teacher directory requests.
    #[arg(long)]
    pub api_token: Option<String>,

    /// Per-request timeout for teacher directory calls, in seconds.
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workspace: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: 30,
        }
    }
}
