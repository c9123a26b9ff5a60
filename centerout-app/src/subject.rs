use centerout_core::{Position, State, distance};
use rand::Rng;
use std::time::Duration;

/// States in which a lapsing subject gives up on the target
const LAPSE_STATES: [State; 7] = [
    State::MoveA,
    State::HoldA,
    State::DelayA,
    State::MoveB,
    State::HoldB,
    State::MoveC,
    State::HoldC,
];

/// Simulated subject steering the cursor toward whatever target is shown.
///
/// Once per trial the subject may lapse: in one randomly chosen behavioral
/// state it moves away from the target instead, which produces the failure
/// for that state.
#[derive(Debug)]
pub struct Subject<R: Rng> {
    speed: f64,
    lapse_rate: f64,
    lapse_in: Option<State>,
    trial: usize,
    rng: R,
}

impl<R: Rng> Subject<R> {
    /// `lapse_rate` must be within `[0, 1]`.
    pub fn new(speed: f64, lapse_rate: f64, rng: R) -> Self {
        Self {
            speed,
            lapse_rate,
            lapse_in: None,
            trial: 0,
            rng,
        }
    }

    pub fn lapse_state(&self) -> Option<State> {
        self.lapse_in
    }

    /// Cursor position after `dt` of movement
    pub fn step(
        &mut self,
        trial: usize,
        state: State,
        cursor: Position,
        target: Option<Position>,
        dt: Duration,
    ) -> Position {
        if trial != self.trial {
            self.trial = trial;
            self.lapse_in = self
                .rng
                .random_bool(self.lapse_rate)
                .then(|| LAPSE_STATES[self.rng.random_range(0..LAPSE_STATES.len())]);
        }

        let Some(target) = target else {
            return cursor;
        };
        let max_step = self.speed * dt.as_secs_f64();
        if self.lapse_in == Some(state) {
            move_away(cursor, target, max_step)
        } else {
            move_toward(cursor, target, max_step)
        }
    }
}

pub fn move_toward(from: Position, to: Position, max_step: f64) -> Position {
    let d = distance(from, to);
    if d <= max_step {
        return to;
    }
    let k = max_step / d;
    (
        from.0 + (to.0 - from.0) * k,
        from.1 + (to.1 - from.1) * k,
        from.2 + (to.2 - from.2) * k,
    )
}

pub fn move_away(from: Position, target: Position, max_step: f64) -> Position {
    let d = distance(from, target);
    if d == 0.0 {
        // any direction will do
        return (from.0 + max_step, from.1, from.2);
    }
    let k = max_step / d;
    (
        from.0 + (from.0 - target.0) * k,
        from.1 + (from.1 - target.1) * k,
        from.2 + (from.2 - target.2) * k,
    )
}
