use crate::config::TaskConfig;
use crate::error::{ConfigError, TaskError};
use crate::targets::{Target, TargetSet};
use crate::trial::{Outcome, TrialOutcome};
use centerout_core::{CUE, CURSOR, Environment, HOME, State, TARGET, TransitionTable, Trigger};
use centerout_timing::{TimerHandle, TimerService};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Longest run of synchronous follow-up transitions one external trigger may
/// cause before the controller gives up.
pub const MAX_CHAIN: usize = 64;

/// Receives the generation of an expired timer
pub type ExpirySink = Arc<dyn Fn(u64) + Send + Sync>;

struct ArmedTimeout {
    generation: u64,
    handle: TimerHandle,
}

/// Follow-up requested by an entry action, applied before `apply` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUp {
    Fire(Trigger),
    Enter(State),
}

/// Event-driven controller for the delayed center-out, out-center task.
///
/// Owns the current state, the trial parameters and the single armed timer,
/// and runs every state's entry and exit actions against the environment.
/// Timer expiries reach the controller through its [`ExpirySink`]; a bare
/// controller only logs them, so wrap it in a
/// [`SharedController`](crate::SharedController) to have timeouts applied
/// automatically.
pub struct TrialController<E, T, R>
where
    E: Environment,
    T: TimerService,
    R: Rng,
{
    state: State,
    table: TransitionTable,
    config: TaskConfig,
    targets: TargetSet,
    target_index: Option<usize>,
    trial_number: usize,
    outcomes: Vec<TrialOutcome>,
    env: E,
    timer: T,
    rng: R,
    armed: Option<ArmedTimeout>,
    generation: u64,
    on_expiry: ExpirySink,
}

impl<E, T, R> TrialController<E, T, R>
where
    E: Environment,
    T: TimerService,
    R: Rng,
{
    /// Builds a controller resting in `inactive`. The configuration is
    /// validated here so bad durations never reach the timer.
    pub fn new(config: TaskConfig, env: E, timer: T, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: State::Inactive,
            table: TransitionTable::standard(),
            config,
            targets: TargetSet::default(),
            target_index: None,
            trial_number: 0,
            outcomes: Vec::new(),
            env,
            timer,
            rng,
            armed: None,
            generation: 0,
            on_expiry: Arc::new(|generation| {
                debug!(generation, "timer expired with no dispatcher attached");
            }),
        })
    }

    pub fn with_table(mut self, table: TransitionTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_expiry_sink(mut self, sink: ExpirySink) -> Self {
        self.on_expiry = sink;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Mutable environment access for the driver (e.g. moving the cursor)
    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    pub fn selected_target(&self) -> Option<&Target> {
        self.target_index.and_then(|idx| self.targets.get(idx))
    }

    /// Number of trials set up so far
    pub fn trial_number(&self) -> usize {
        self.trial_number
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn has_pending_timeout(&self) -> bool {
        self.armed.is_some()
    }

    /// Generation of the armed timer, if one is pending
    pub fn armed_generation(&self) -> Option<u64> {
        self.armed.as_ref().map(|armed| armed.generation)
    }

    /// Applies `trigger` and every follow-up it causes, returning the state
    /// the controller rests in. Triggers with no matching rule are ignored.
    ///
    /// A chain longer than [`MAX_CHAIN`] cancels the armed timer, clears the
    /// environment and leaves the controller in `inactive` before returning
    /// [`TaskError::RunawayChain`].
    pub fn apply(&mut self, trigger: Trigger) -> Result<State, TaskError> {
        debug!(%trigger, state = %self.state, "event");
        let mut next = Some(FollowUp::Fire(trigger));
        let mut steps = 0;
        while let Some(follow_up) = next.take() {
            if steps > MAX_CHAIN {
                let stuck = self.state;
                self.cancel_timeout();
                self.clear_environment()?;
                self.state = State::Inactive;
                warn!(state = %stuck, limit = MAX_CHAIN, "runaway transition chain, block stopped");
                return Err(TaskError::RunawayChain {
                    limit: MAX_CHAIN,
                    state: stuck,
                });
            }
            steps += 1;
            next = match follow_up {
                FollowUp::Fire(trigger) => self.fire(trigger)?,
                FollowUp::Enter(dest) => self.transition(dest, None)?,
            };
        }
        Ok(self.state)
    }

    /// Delivers a timer expiry. Expiries from timers that have since been
    /// cancelled or replaced are ignored.
    pub fn expire(&mut self, generation: u64) -> Result<State, TaskError> {
        match self.armed_generation() {
            Some(armed) if armed == generation => {
                self.armed = None;
                self.apply(Trigger::Timeout)
            }
            _ => {
                debug!(generation, state = %self.state, "stale timeout ignored");
                Ok(self.state)
            }
        }
    }

    fn fire(&mut self, trigger: Trigger) -> Result<Option<FollowUp>, TaskError> {
        match self.table.resolve(self.state, trigger) {
            Some(dest) => self.transition(dest, Some(trigger)),
            None => {
                debug!(%trigger, state = %self.state, "trigger ignored");
                Ok(None)
            }
        }
    }

    fn transition(
        &mut self,
        dest: State,
        trigger: Option<Trigger>,
    ) -> Result<Option<FollowUp>, TaskError> {
        let source = self.state;
        self.on_exit(source)?;
        self.state = dest;
        match trigger {
            Some(trigger) => info!(from = %source, to = %dest, %trigger, "state change"),
            None => info!(from = %source, to = %dest, "automatic state change"),
        }
        self.on_enter(dest, source)
    }

    fn on_exit(&mut self, state: State) -> Result<(), TaskError> {
        match state {
            State::Inactive => self.activate(),
            State::TrialSetup | State::TrialTeardown => Ok(()),
            State::DelayA => {
                self.cancel_timeout();
                self.env.destroy(CUE)?;
                Ok(())
            }
            _ => {
                self.cancel_timeout();
                Ok(())
            }
        }
    }

    fn on_enter(&mut self, state: State, from: State) -> Result<Option<FollowUp>, TaskError> {
        match state {
            State::Inactive => {
                self.clear_environment()?;
                Ok(None)
            }
            State::TrialSetup => self.set_up_trial(),
            State::TrialTeardown => {
                self.env.destroy(TARGET)?;
                Ok(Some(FollowUp::Fire(Trigger::EndTrial)))
            }
            State::MoveA | State::MoveC => {
                self.env.set_position(TARGET, HOME)?;
                self.set_parameterized_timeout(state)
            }
            State::DelayA => {
                let target = self.selected(state)?;
                let radius = target.radius.unwrap_or(self.config.target.radius);
                let color = target.color.unwrap_or(self.config.cue_color);
                self.env.create(CUE)?;
                self.env.set_position(CUE, target.position)?;
                self.env.set_radius(CUE, radius)?;
                self.env.set_color(CUE, color)?;
                self.set_parameterized_timeout(state)
            }
            State::MoveB => {
                let target = self.selected(state)?;
                self.env.set_position(TARGET, target.position)?;
                self.set_parameterized_timeout(state)
            }
            State::Success | State::Failure => {
                self.record_outcome(state, from);
                self.set_parameterized_timeout(state)
            }
            State::Intertrial | State::HoldA | State::HoldB | State::HoldC => {
                self.set_parameterized_timeout(state)
            }
        }
    }

    /// Loads the block's target set and styles the cursor
    fn activate(&mut self) -> Result<(), TaskError> {
        self.targets = match &self.config.targets_path {
            Some(path) => TargetSet::load(path)?,
            None => TargetSet::default(),
        };
        self.target_index = None;
        let cursor = self.config.cursor;
        self.env.set_color(CURSOR, cursor.color)?;
        self.env.set_radius(CURSOR, cursor.radius)?;
        info!(targets = self.targets.len(), "block activated");
        Ok(())
    }

    /// Removes everything but the cursor
    fn clear_environment(&mut self) -> Result<(), TaskError> {
        for name in self.env.names() {
            if name != CURSOR {
                self.env.destroy(&name)?;
            }
        }
        self.target_index = None;
        Ok(())
    }

    fn set_up_trial(&mut self) -> Result<Option<FollowUp>, TaskError> {
        let style = self.config.target;
        self.env.create(TARGET)?;
        self.env.set_color(TARGET, style.color)?;
        self.env.set_radius(TARGET, style.radius)?;

        self.trial_number += 1;
        let index = self.targets.choose(&mut self.rng);
        self.target_index = Some(index);
        debug!(trial = self.trial_number, target = index, "trial set up");

        Ok(Some(FollowUp::Enter(State::MoveA)))
    }

    fn selected(&self, state: State) -> Result<Target, TaskError> {
        self.selected_target()
            .cloned()
            .ok_or(TaskError::NoTargetSelected(state))
    }

    fn record_outcome(&mut self, state: State, from: State) {
        let outcome = match state {
            State::Success => Outcome::Success,
            _ => Outcome::Failure,
        };
        info!(trial = self.trial_number, ?outcome, ended_in = %from, "trial outcome");
        self.outcomes.push(TrialOutcome {
            trial: self.trial_number,
            target_index: self.target_index,
            outcome,
            ended_in: from,
        });
    }

    /// Arms the timeout configured for `state`, replacing any armed timer.
    /// A zero duration requests a synchronous `timeout` instead.
    fn set_parameterized_timeout(&mut self, state: State) -> Result<Option<FollowUp>, TaskError> {
        self.cancel_timeout();
        let Some(delay) = self.config.timeouts.duration(state) else {
            return Ok(None);
        };
        if delay.is_zero() {
            trace!(%state, "zero timeout fires synchronously");
            return Ok(Some(FollowUp::Fire(Trigger::Timeout)));
        }

        self.generation += 1;
        let generation = self.generation;
        let sink = Arc::clone(&self.on_expiry);
        let handle = self
            .timer
            .schedule(delay, Box::new(move || sink(generation)))?;
        trace!(%state, generation, delay_ms = delay.as_secs_f64() * 1e3, "timeout armed");
        self.armed = Some(ArmedTimeout { generation, handle });
        Ok(None)
    }

    fn cancel_timeout(&mut self) {
        if let Some(armed) = self.armed.take() {
            self.timer.cancel(&armed.handle);
            trace!(generation = armed.generation, "timeout cancelled");
        }
    }
}

impl<E, T, R> Drop for TrialController<E, T, R>
where
    E: Environment,
    T: TimerService,
    R: Rng,
{
    fn drop(&mut self) {
        self.cancel_timeout();
    }
}
