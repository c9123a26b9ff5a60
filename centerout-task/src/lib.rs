pub mod config;
pub mod controller;
pub mod error;
pub mod shared;
pub mod targets;
pub mod trial;

pub use config::{SphereStyle, TaskConfig, Timeouts};
pub use controller::{ExpirySink, MAX_CHAIN, TrialController};
pub use error::{ConfigError, TaskError};
pub use shared::SharedController;
pub use targets::{Target, TargetSet};
pub use trial::{Outcome, OutcomeSummary, TrialOutcome};
