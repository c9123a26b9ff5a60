use crate::state::{State, Trigger};

/// Source side of a transition rule
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    State(State),
    /// Matches every state
    Any,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub trigger: Trigger,
    pub source: Source,
    pub dest: State,
}

const fn rule(trigger: Trigger, source: State, dest: State) -> Transition {
    Transition {
        trigger,
        source: Source::State(source),
        dest,
    }
}

const fn any(trigger: Trigger, dest: State) -> Transition {
    Transition {
        trigger,
        source: Source::Any,
        dest,
    }
}

use State::*;
use Trigger::*;

/// Trial rules of the delayed center-out, out-center task.
///
/// The first group segments blocks and trials; the second group encodes the
/// behavioral objectives.
const STANDARD: &[Transition] = &[
    rule(StartBlock, Inactive, Intertrial),
    rule(StartTrial, Intertrial, TrialSetup),
    rule(Timeout, Intertrial, TrialSetup),
    rule(Timeout, Failure, TrialTeardown),
    rule(Timeout, Success, TrialTeardown),
    rule(EndTrial, TrialTeardown, Intertrial),
    any(EndBlock, Inactive),
    rule(TargetEngaged, MoveA, HoldA),
    rule(Timeout, MoveA, Failure),
    rule(Timeout, HoldA, DelayA),
    rule(TargetDisengaged, HoldA, Failure),
    rule(Timeout, DelayA, MoveB),
    rule(TargetDisengaged, DelayA, Failure),
    rule(TargetEngaged, MoveB, HoldB),
    rule(Timeout, MoveB, Failure),
    rule(Timeout, HoldB, MoveC),
    rule(TargetDisengaged, HoldB, Failure),
    rule(TargetEngaged, MoveC, HoldC),
    rule(Timeout, MoveC, Failure),
    rule(Timeout, HoldC, Success),
    rule(TargetDisengaged, HoldC, Failure),
];

/// Static (trigger, source, dest) rule set with exact-then-wildcard lookup
#[derive(Copy, Clone, Debug)]
pub struct TransitionTable {
    rules: &'static [Transition],
}

impl TransitionTable {
    pub const fn standard() -> Self {
        Self { rules: STANDARD }
    }

    pub const fn from_rules(rules: &'static [Transition]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [Transition] {
        self.rules
    }

    /// Destination for `trigger` fired in `current`, if any rule matches.
    ///
    /// A rule naming `current` explicitly wins over a wildcard rule.
    pub fn resolve(&self, current: State, trigger: Trigger) -> Option<State> {
        let matching = || self.rules.iter().filter(move |t| t.trigger == trigger);
        matching()
            .find(|t| t.source == Source::State(current))
            .or_else(|| matching().find(|t| t.source == Source::Any))
            .map(|t| t.dest)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_every_row() {
        assert_eq!(TransitionTable::standard().rules().len(), 21);
    }

    #[test]
    fn at_most_one_exact_rule_per_pair() {
        let table = TransitionTable::standard();
        for state in State::ALL {
            for trigger in Trigger::ALL {
                let exact = table
                    .rules()
                    .iter()
                    .filter(|t| t.trigger == trigger && t.source == Source::State(state))
                    .count();
                assert!(exact <= 1, "{state} + {trigger} has {exact} rules");
            }
        }
    }

    #[test]
    fn end_block_reaches_inactive_from_anywhere() {
        let table = TransitionTable::standard();
        for state in State::ALL {
            assert_eq!(table.resolve(state, EndBlock), Some(Inactive));
        }
    }

    #[test]
    fn exact_rule_shadows_wildcard() {
        static RULES: &[Transition] = &[any(Timeout, Failure), rule(Timeout, HoldC, Success)];
        let table = TransitionTable::from_rules(RULES);
        assert_eq!(table.resolve(HoldC, Timeout), Some(Success));
        assert_eq!(table.resolve(MoveA, Timeout), Some(Failure));
    }

    #[test]
    fn behavioral_rules() {
        let table = TransitionTable::standard();
        assert_eq!(table.resolve(MoveA, TargetEngaged), Some(HoldA));
        assert_eq!(table.resolve(DelayA, TargetDisengaged), Some(Failure));
        assert_eq!(table.resolve(MoveC, Timeout), Some(Failure));
        assert_eq!(table.resolve(MoveC, TargetEngaged), Some(HoldC));
        assert_eq!(table.resolve(HoldC, Timeout), Some(Success));
    }

    #[test]
    fn unmatched_pairs_resolve_to_none() {
        let table = TransitionTable::standard();
        assert_eq!(table.resolve(Inactive, Timeout), None);
        assert_eq!(table.resolve(MoveB, TargetDisengaged), None);
        assert_eq!(table.resolve(TrialSetup, StartTrial), None);
        assert_eq!(table.resolve(Success, TargetDisengaged), None);
    }
}
