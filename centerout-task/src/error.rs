use centerout_core::{EnvironmentError, State};
use centerout_timing::TimerError;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while loading or validating task configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timeout for '{state}' must be a finite, non-negative number of seconds (got {seconds})")]
    InvalidTimeout { state: State, seconds: f64 },

    #[error("state '{0}' has no timeout parameter")]
    NotATimeout(State),

    #[error("radius of {name} must be positive and finite (got {radius})")]
    InvalidRadius { name: String, radius: f64 },

    #[error("color channels of {0} must lie in [0, 1]")]
    InvalidColor(String),

    #[error("target set is empty")]
    EmptyTargets,

    #[error("unsupported target file format: {} (expected .yaml, .yml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid timeout override '{0}' (expected STATE=SECONDS)")]
    InvalidOverride(String),
}

/// Failures while applying triggers to the trial controller
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("state '{0}' needs a selected target but none is chosen")]
    NoTargetSelected(State),

    #[error("more than {limit} chained transitions without external input (stuck near '{state}')")]
    RunawayChain { limit: usize, state: State },
}
