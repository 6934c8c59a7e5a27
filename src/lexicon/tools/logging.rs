use tracing_subscriber::EnvFilter;

use crate::lexicon::tools::error::{Result, ToolError};

/// Maps the number of `-v` flags onto a default log level.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// verbosity-derived level. Output goes to stderr so prompts and reports on
/// stdout stay readable.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}
