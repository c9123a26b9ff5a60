use crate::logging::LogFormat;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Runs one block of the delayed center-out, out-center reaching task with a
/// simulated subject.
#[derive(Debug, Parser)]
#[command(name = "centerout", version, about)]
pub struct Cli {
    /// YAML task configuration (timeouts, sphere styles, targets file)
    #[arg(short, long, env = "CENTEROUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// YAML or JSON target list, overriding the configuration
    #[arg(long)]
    pub targets: Option<PathBuf>,

    /// Number of trials to run before ending the block
    #[arg(short = 'n', long, default_value_t = 10)]
    pub trials: usize,

    /// Seed for target selection and the simulated subject
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that the subject lapses at some point of a trial
    #[arg(long, default_value_t = 0.2)]
    pub lapse_rate: f64,

    /// Cursor speed of the simulated subject, in units per second
    #[arg(long, default_value_t = 2.0)]
    pub speed: f64,

    /// Rate at which engagement is sampled, in Hz
    #[arg(long, default_value_t = 120.0)]
    pub frame_rate: f64,

    /// Timeout override, repeatable (e.g. --timeout hold_a=0.75)
    #[arg(long = "timeout", value_name = "STATE=SECONDS")]
    pub timeouts: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}
