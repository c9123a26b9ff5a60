//! Logging initialization.
//!
//! Structured logging via `tracing` with human-readable and JSON output,
//! verbosity from `-v` flags, and an override through `CENTEROUT_LOG`.

use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    /// Newline-delimited JSON
    Json,
}

/// Maps a verbosity level to a tracing directive
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `CENTEROUT_LOG` takes precedence over
/// `verbosity`; repeated calls are ignored.
pub fn init_logging(format: LogFormat, verbosity: u8) {
    let filter = EnvFilter::try_from_env("CENTEROUT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(verbosity >= 2)
                .with_thread_names(verbosity >= 3)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
