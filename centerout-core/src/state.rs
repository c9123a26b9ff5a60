use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task states of the delayed center-out, out-center trial
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    Inactive,
    Intertrial,
    TrialSetup,
    MoveA,
    HoldA,
    DelayA,
    MoveB,
    HoldB,
    MoveC,
    HoldC,
    Success,
    Failure,
    TrialTeardown,
}

impl State {
    pub const ALL: [State; 13] = [
        State::Inactive,
        State::Intertrial,
        State::TrialSetup,
        State::MoveA,
        State::HoldA,
        State::DelayA,
        State::MoveB,
        State::HoldB,
        State::MoveC,
        State::HoldC,
        State::Success,
        State::Failure,
        State::TrialTeardown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Inactive => "inactive",
            State::Intertrial => "intertrial",
            State::TrialSetup => "trial_setup",
            State::MoveA => "move_a",
            State::HoldA => "hold_a",
            State::DelayA => "delay_a",
            State::MoveB => "move_b",
            State::HoldB => "hold_b",
            State::MoveC => "move_c",
            State::HoldC => "hold_c",
            State::Success => "success",
            State::Failure => "failure",
            State::TrialTeardown => "trial_teardown",
        }
    }

    /// States that arm a parameterized timeout on entry
    pub fn has_timeout(&self) -> bool {
        !matches!(
            self,
            State::Inactive | State::TrialSetup | State::TrialTeardown
        )
    }

    /// Task-specific states between setup and teardown where the subject acts
    pub fn is_behavioral(&self) -> bool {
        matches!(
            self,
            State::MoveA
                | State::HoldA
                | State::DelayA
                | State::MoveB
                | State::HoldB
                | State::MoveC
                | State::HoldC
        )
    }

    pub fn is_outcome(&self) -> bool {
        matches!(self, State::Success | State::Failure)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown state '{s}'"))
    }
}

/// Events fed to the trial controller
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    StartBlock,
    StartTrial,
    Timeout,
    TargetEngaged,
    TargetDisengaged,
    EndTrial,
    EndBlock,
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::StartBlock,
        Trigger::StartTrial,
        Trigger::Timeout,
        Trigger::TargetEngaged,
        Trigger::TargetDisengaged,
        Trigger::EndTrial,
        Trigger::EndBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::StartBlock => "start_block",
            Trigger::StartTrial => "start_trial",
            Trigger::Timeout => "timeout",
            Trigger::TargetEngaged => "target_engaged",
            Trigger::TargetDisengaged => "target_disengaged",
            Trigger::EndTrial => "end_trial",
            Trigger::EndBlock => "end_block",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::ALL
            .into_iter()
            .find(|trigger| trigger.as_str() == s)
            .ok_or_else(|| format!("unknown trigger '{s}'"))
    }
}
