//! Full trial sequences stepped one trigger at a time. Timers are armed on a
//! manual clock that is never advanced, so every `timeout` here is injected
//! by the test.

use centerout_core::{CUE, CURSOR, Environment, HOME, SphereEnvironment, State, TARGET, Trigger};
use centerout_task::{Outcome, TaskConfig, TrialController};
use centerout_timing::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;

struct Harness {
    controller: TrialController<SphereEnvironment, ManualTimer, StdRng>,
    timer: ManualTimer,
}

impl Harness {
    fn new() -> Self {
        let timer = ManualTimer::new();
        let controller = TrialController::new(
            TaskConfig::default(),
            SphereEnvironment::new(),
            timer.clone(),
            StdRng::seed_from_u64(2022),
        )
        .unwrap();
        Self { controller, timer }
    }

    fn env(&self) -> &SphereEnvironment {
        self.controller.environment()
    }

    fn trigger(&mut self, trigger: Trigger, expected: State) {
        let state = self.controller.apply(trigger).unwrap();
        assert_eq!(state, expected, "after {trigger}");
        assert_eq!(self.controller.state(), expected);
        assert!(self.timer.pending() <= 1, "more than one timer pending");
    }

    fn end_block(&mut self) {
        self.trigger(Trigger::EndBlock, State::Inactive);
        assert_eq!(self.env().names(), vec![CURSOR.to_string()]);
    }

    fn start_block(&mut self) {
        self.trigger(Trigger::StartBlock, State::Intertrial);
        assert!(!self.controller.targets().is_empty());
    }

    fn intertrial_timeout(&mut self) {
        let trials = self.controller.trial_number();
        self.trigger(Trigger::Timeout, State::MoveA);
        assert_eq!(self.controller.trial_number(), trials + 1);
        assert!(self.controller.target_index().is_some());
        assert!(self.env().exists(TARGET));
        assert_eq!(self.env().position(TARGET).unwrap(), HOME);
        assert!(self.controller.has_pending_timeout());
    }

    fn move_a_engaged(&mut self) {
        self.trigger(Trigger::TargetEngaged, State::HoldA);
    }

    fn hold_a_timeout(&mut self) {
        self.trigger(Trigger::Timeout, State::DelayA);
        assert!(self.env().exists(CUE));
    }

    fn delay_a_timeout(&mut self) {
        let target = self.env().position(TARGET).unwrap();
        let cue = self.env().position(CUE).unwrap();
        self.trigger(Trigger::Timeout, State::MoveB);
        assert_ne!(self.env().position(TARGET).unwrap(), target);
        assert_eq!(self.env().position(TARGET).unwrap(), cue);
        assert!(!self.env().exists(CUE));
    }

    fn move_b_engaged(&mut self) {
        self.trigger(Trigger::TargetEngaged, State::HoldB);
    }

    fn hold_b_timeout(&mut self) {
        let target = self.env().position(TARGET).unwrap();
        self.trigger(Trigger::Timeout, State::MoveC);
        assert_ne!(self.env().position(TARGET).unwrap(), target);
        assert_eq!(self.env().position(TARGET).unwrap(), HOME);
    }

    fn move_c_engaged(&mut self) {
        self.trigger(Trigger::TargetEngaged, State::HoldC);
    }

    fn outcome_timeout(&mut self) {
        self.trigger(Trigger::Timeout, State::Intertrial);
        assert_eq!(self.env().names(), vec![CURSOR.to_string()]);
    }

    fn begin(&mut self) {
        self.end_block();
        self.start_block();
        self.intertrial_timeout();
    }

    fn assert_failed_in(&self, state: State) {
        let last = self.controller.outcomes().last().unwrap();
        assert_eq!(last.outcome, Outcome::Failure);
        assert_eq!(last.ended_in, state);
    }
}

#[test]
fn success() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.hold_a_timeout();
    h.delay_a_timeout();
    h.move_b_engaged();
    h.hold_b_timeout();
    h.move_c_engaged();
    h.trigger(Trigger::Timeout, State::Success);
    h.outcome_timeout();
    assert_eq!(h.controller.outcomes().len(), 1);
    assert_eq!(h.controller.outcomes()[0].outcome, Outcome::Success);
}

#[test]
fn hold_c_failure() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.hold_a_timeout();
    h.delay_a_timeout();
    h.move_b_engaged();
    h.hold_b_timeout();
    h.move_c_engaged();
    h.trigger(Trigger::TargetDisengaged, State::Failure);
    h.assert_failed_in(State::HoldC);
    h.outcome_timeout();
}

#[test]
fn move_c_failure() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.hold_a_timeout();
    h.delay_a_timeout();
    h.move_b_engaged();
    h.hold_b_timeout();
    h.trigger(Trigger::Timeout, State::Failure);
    h.assert_failed_in(State::MoveC);
    h.outcome_timeout();
}

#[test]
fn hold_b_failure() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.hold_a_timeout();
    h.delay_a_timeout();
    h.move_b_engaged();
    h.trigger(Trigger::TargetDisengaged, State::Failure);
    h.assert_failed_in(State::HoldB);
    h.outcome_timeout();
}

#[test]
fn move_b_failure() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.hold_a_timeout();
    h.delay_a_timeout();
    h.trigger(Trigger::Timeout, State::Failure);
    h.assert_failed_in(State::MoveB);
    h.outcome_timeout();
}

#[test]
fn delay_a_failure() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.hold_a_timeout();
    h.trigger(Trigger::TargetDisengaged, State::Failure);
    assert!(!h.env().exists(CUE));
    h.assert_failed_in(State::DelayA);
    h.outcome_timeout();
}

#[test]
fn hold_a_failure() {
    let mut h = Harness::new();
    h.begin();
    h.move_a_engaged();
    h.trigger(Trigger::TargetDisengaged, State::Failure);
    h.assert_failed_in(State::HoldA);
    h.outcome_timeout();
}

#[test]
fn move_a_failure() {
    let mut h = Harness::new();
    h.begin();
    h.trigger(Trigger::Timeout, State::Failure);
    h.assert_failed_in(State::MoveA);
    h.outcome_timeout();
}

#[test]
fn consecutive_trials_in_one_block() {
    let mut h = Harness::new();
    h.begin();
    h.trigger(Trigger::Timeout, State::Failure);
    h.outcome_timeout();

    h.trigger(Trigger::StartTrial, State::MoveA);
    h.move_a_engaged();
    h.hold_a_timeout();
    h.trigger(Trigger::TargetDisengaged, State::Failure);
    h.outcome_timeout();

    let trials: Vec<_> = h.controller.outcomes().iter().map(|o| o.trial).collect();
    assert_eq!(trials, vec![1, 2]);
    h.end_block();
}

#[test]
fn unmatched_triggers_leave_state_unchanged() {
    let mut h = Harness::new();
    let resting = [
        (vec![], State::Inactive),
        (vec![Trigger::StartBlock], State::Intertrial),
        (vec![Trigger::StartTrial], State::MoveA),
        (vec![Trigger::TargetEngaged], State::HoldA),
        (vec![Trigger::Timeout], State::DelayA),
        (vec![Trigger::Timeout], State::MoveB),
        (vec![Trigger::TargetEngaged], State::HoldB),
        (vec![Trigger::Timeout], State::MoveC),
        (vec![Trigger::TargetEngaged], State::HoldC),
        (vec![Trigger::Timeout], State::Success),
    ];
    let table = centerout_core::TransitionTable::standard();

    for (steps, state) in resting {
        for step in steps {
            h.controller.apply(step).unwrap();
        }
        assert_eq!(h.controller.state(), state);
        for trigger in Trigger::ALL {
            if table.resolve(state, trigger).is_none() {
                let names = h.env().names();
                assert_eq!(h.controller.apply(trigger).unwrap(), state);
                assert_eq!(h.env().names(), names);
            }
        }
    }
}
