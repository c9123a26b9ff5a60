use crate::controller::{ExpirySink, TrialController};
use crate::error::TaskError;
use centerout_core::{Environment, State, Trigger};
use centerout_timing::TimerService;
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::error;

/// Thread-safe handle that serializes driver triggers and timer expiries
/// through one mutex.
///
/// Timer callbacks hold only a weak reference, so dropping every handle
/// releases the controller even while timers are still pending.
pub struct SharedController<E, T, R>
where
    E: Environment,
    T: TimerService,
    R: Rng,
{
    inner: Arc<Mutex<TrialController<E, T, R>>>,
}

impl<E, T, R> Clone for SharedController<E, T, R>
where
    E: Environment,
    T: TimerService,
    R: Rng,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E, T, R> SharedController<E, T, R>
where
    E: Environment + 'static,
    T: TimerService,
    R: Rng + Send + 'static,
{
    pub fn new(controller: TrialController<E, T, R>) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Mutex<TrialController<E, T, R>>>| {
            let weak = weak.clone();
            let sink: ExpirySink = Arc::new(move |generation| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let mut controller = inner.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(err) = controller.expire(generation) {
                    error!(%err, state = %controller.state(), "timeout handling failed");
                }
            });
            Mutex::new(controller.with_expiry_sink(sink))
        });
        Self { inner }
    }

    /// Locks the controller. Do not hold the guard while driving a timer
    /// that delivers expiries on the calling thread.
    pub fn lock(&self) -> MutexGuard<'_, TrialController<E, T, R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply(&self, trigger: Trigger) -> Result<State, TaskError> {
        self.lock().apply(trigger)
    }

    pub fn state(&self) -> State {
        self.lock().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use centerout_core::SphereEnvironment;
    use centerout_timing::{ManualTimer, ThreadTimer};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::{Duration, Instant};

    fn shared<T: TimerService>(
        timer: T,
        config: TaskConfig,
    ) -> SharedController<SphereEnvironment, T, StdRng> {
        SharedController::new(TrialController::new(
            config,
            SphereEnvironment::new(),
            timer,
            StdRng::seed_from_u64(3),
        )
        .unwrap())
    }

    #[test]
    fn expiry_applies_timeout() {
        let timer = ManualTimer::new();
        let c = shared(timer.clone(), TaskConfig::default());
        c.apply(Trigger::StartBlock).unwrap();

        assert!(timer.fire_next());
        assert_eq!(c.state(), State::MoveA);
        assert!(timer.advance(Duration::from_secs(2)) == 1);
        assert_eq!(c.state(), State::Failure);
        assert!(timer.fire_next());
        assert_eq!(c.state(), State::Intertrial);
    }

    #[test]
    fn rearming_invalidates_the_previous_callback() {
        let timer = ManualTimer::new();
        let c = shared(timer.clone(), TaskConfig::default());
        c.apply(Trigger::StartBlock).unwrap();
        c.apply(Trigger::StartTrial).unwrap();
        c.apply(Trigger::TargetEngaged).unwrap();
        assert_eq!(c.state(), State::HoldA);
        assert_eq!(timer.pending(), 1);

        // intertrial and move_a timers were cancelled; replaying them must not
        // push hold_a forward
        assert_eq!(timer.fire_stale(), 2);
        assert_eq!(c.state(), State::HoldA);

        assert!(timer.fire_next());
        assert_eq!(c.state(), State::DelayA);
    }

    #[test]
    fn dropping_the_handle_releases_pending_callbacks() {
        let timer = ManualTimer::new();
        let c = shared(timer.clone(), TaskConfig::default());
        c.apply(Trigger::StartBlock).unwrap();
        drop(c);
        assert_eq!(timer.pending(), 0);
        // the weak reference no longer upgrades
        assert_eq!(timer.fire_stale(), 1);
    }

    #[test]
    fn enormous_timeout_does_not_fire_early() {
        let config =
            TaskConfig::from_yaml_str("timeouts:\n  move_a: 1.0e300\n  intertrial: 0.005\n")
                .unwrap();
        let c = shared(ThreadTimer::new(), config);
        c.apply(Trigger::StartBlock).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while c.state() != State::MoveA && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(c.state(), State::MoveA);

        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(c.state(), State::MoveA);
        c.apply(Trigger::EndBlock).unwrap();
    }

    #[test]
    fn thread_timer_drives_a_trial_to_failure() {
        let mut config = TaskConfig::default();
        config.timeouts.intertrial = 0.005;
        config.timeouts.move_a = 0.01;
        config.timeouts.failure = 10.0;
        let c = shared(ThreadTimer::new(), config);
        c.apply(Trigger::StartBlock).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while c.state() != State::Failure && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(c.state(), State::Failure);
        assert_eq!(c.lock().outcomes().len(), 1);
        c.apply(Trigger::EndBlock).unwrap();
    }
}
