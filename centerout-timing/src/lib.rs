pub mod manual;
pub mod timer;

pub use manual::{MAX_STALE, ManualTimer};
pub use timer::{
    LatencyStats, ThreadTimer, TimerCallback, TimerError, TimerHandle, TimerService,
    high_precision_sleep,
};
