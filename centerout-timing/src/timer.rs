use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{trace, warn};

/// Work to run once a timer expires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("failed to start timer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Token for a scheduled callback; cancelling it stops a pending delivery
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Schedules one-shot callbacks on a clock the caller does not block on
pub trait TimerService: Send + Sync + 'static {
    fn schedule(&self, delay: Duration, callback: TimerCallback)
    -> Result<TimerHandle, TimerError>;

    /// Cancelling an expired or already-cancelled handle is a no-op.
    fn cancel(&self, handle: &TimerHandle);
}

/// Delivery latency of fired timers (actual minus requested delay)
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub samples: usize,
    pub mean_ns: f64,
    pub jitter_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
}

impl LatencyStats {
    pub fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let times: Vec<f64> = samples.iter().map(|d| d.as_nanos() as f64).collect();
        let n = times.len() as f64;
        let mean = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            samples: times.len(),
            mean_ns: mean,
            jitter_ns: var.sqrt(),
            min_ns: min,
            max_ns: max,
        }
    }
}

/// Timer service that sleeps on a dedicated thread per scheduled callback
#[derive(Debug, Clone)]
pub struct ThreadTimer {
    next_id: Arc<AtomicU64>,
    latencies: Arc<Mutex<Vec<Duration>>>,
    max_samples: usize,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            latencies: Arc::new(Mutex::new(Vec::with_capacity(1000))),
            max_samples: 1000,
        }
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let samples = self
            .latencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        LatencyStats::from_samples(&samples)
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for ThreadTimer {
    fn schedule(
        &self,
        delay: Duration,
        callback: TimerCallback,
    ) -> Result<TimerHandle, TimerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = TimerHandle::new(id);
        let token = handle.clone();
        let latencies = Arc::clone(&self.latencies);
        let max_samples = self.max_samples;

        thread::Builder::new()
            .name(format!("timeout-{id}"))
            .spawn(move || {
                let start = Instant::now();
                high_precision_sleep(delay);
                if token.is_cancelled() {
                    trace!(timer = id, "cancelled timer expired silently");
                    return;
                }
                let late = start.elapsed().saturating_sub(delay);
                {
                    let mut samples = latencies.lock().unwrap_or_else(PoisonError::into_inner);
                    if samples.len() >= max_samples {
                        samples.remove(0);
                    }
                    samples.push(late);
                }
                if late > Duration::from_millis(5) {
                    warn!(timer = id, late_us = late.as_micros() as u64, "timer fired late");
                }
                callback();
            })?;

        trace!(timer = id, delay_ms = delay.as_secs_f64() * 1e3, "timer scheduled");
        Ok(handle)
    }

    fn cancel(&self, handle: &TimerHandle) {
        handle.mark_cancelled();
    }
}

/// High precision sleep (platform specific)
pub fn high_precision_sleep(duration: Duration) {
    #[cfg(target_os = "linux")]
    linux_sleep(duration);
    #[cfg(not(target_os = "linux"))]
    thread::sleep(duration);
}

#[cfg(target_os = "linux")]
fn linux_sleep(duration: Duration) {
    use libc::{CLOCK_MONOTONIC, EINTR, clock_gettime, clock_nanosleep, timespec};

    let mut now = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        clock_gettime(CLOCK_MONOTONIC, &mut now);
    }
    // Absolute deadline so a signal interruption resumes without drift.
    let deadline = deadline_after(now, duration);

    loop {
        let rc = unsafe {
            clock_nanosleep(
                CLOCK_MONOTONIC,
                libc::TIMER_ABSTIME,
                &deadline,
                std::ptr::null_mut(),
            )
        };
        if rc != EINTR {
            break;
        }
    }
}

/// `now + duration`, saturating at the largest representable time.
#[cfg(target_os = "linux")]
fn deadline_after(now: libc::timespec, duration: Duration) -> libc::timespec {
    const NANOS_PER_SEC: u64 = 1_000_000_000;

    let nanos = now.tv_nsec as u64 + u64::from(duration.subsec_nanos());
    let secs = libc::time_t::try_from(duration.as_secs()).unwrap_or(libc::time_t::MAX);
    let mut deadline = now;
    deadline.tv_sec = now
        .tv_sec
        .saturating_add(secs)
        .saturating_add((nanos / NANOS_PER_SEC) as libc::time_t);
    deadline.tv_nsec = if deadline.tv_sec == libc::time_t::MAX {
        (NANOS_PER_SEC - 1) as libc::c_long
    } else {
        (nanos % NANOS_PER_SEC) as libc::c_long
    };
    deadline
}
