use centerout_core::State;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// 1-based trial number within the controller's lifetime
    pub trial: usize,
    pub target_index: Option<usize>,
    pub outcome: Outcome,
    /// State the trial left when the outcome was decided
    pub ended_in: State,
}

/// Tally of outcomes, failures broken down by the state they happened in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeSummary {
    pub successes: usize,
    pub failures: usize,
    pub failures_by_state: BTreeMap<State, usize>,
}

impl OutcomeSummary {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let mut summary = Self::default();
        for trial in outcomes {
            match trial.outcome {
                Outcome::Success => summary.successes += 1,
                Outcome::Failure => {
                    summary.failures += 1;
                    *summary.failures_by_state.entry(trial.ended_in).or_default() += 1;
                }
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.successes + self.failures
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.successes as f64 / self.total() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(trial: usize, outcome: Outcome, ended_in: State) -> TrialOutcome {
        TrialOutcome {
            trial,
            target_index: Some(0),
            outcome,
            ended_in,
        }
    }

    #[test]
    fn summary_counts_failures_per_state() {
        let summary = OutcomeSummary::from_outcomes(&[
            outcome(1, Outcome::Success, State::HoldC),
            outcome(2, Outcome::Failure, State::MoveA),
            outcome(3, Outcome::Failure, State::MoveA),
            outcome(4, Outcome::Failure, State::DelayA),
        ]);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures_by_state[&State::MoveA], 2);
        assert_eq!(summary.failures_by_state[&State::DelayA], 1);
        assert_eq!(summary.success_rate(), 0.25);
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        assert_eq!(OutcomeSummary::from_outcomes(&[]).success_rate(), 0.0);
    }
}
