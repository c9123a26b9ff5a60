use crate::error::ConfigError;
use centerout_core::{Rgba, State};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout per duration-bearing state, in seconds.
///
/// A zero timeout fires synchronously on state entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    pub move_a: f64,
    pub hold_a: f64,
    pub delay_a: f64,
    pub move_b: f64,
    pub hold_b: f64,
    pub move_c: f64,
    pub hold_c: f64,
    pub success: f64,
    pub failure: f64,
    pub intertrial: f64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            move_a: 2.0,
            hold_a: 0.5,
            delay_a: 0.5,
            move_b: 1.0,
            hold_b: 0.5,
            move_c: 1.0,
            hold_c: 0.5,
            success: 0.01,
            failure: 0.2,
            intertrial: 0.01,
        }
    }
}

impl Timeouts {
    pub fn seconds(&self, state: State) -> Option<f64> {
        Some(match state {
            State::MoveA => self.move_a,
            State::HoldA => self.hold_a,
            State::DelayA => self.delay_a,
            State::MoveB => self.move_b,
            State::HoldB => self.hold_b,
            State::MoveC => self.move_c,
            State::HoldC => self.hold_c,
            State::Success => self.success,
            State::Failure => self.failure,
            State::Intertrial => self.intertrial,
            State::Inactive | State::TrialSetup | State::TrialTeardown => return None,
        })
    }

    fn slot(&mut self, state: State) -> Option<&mut f64> {
        Some(match state {
            State::MoveA => &mut self.move_a,
            State::HoldA => &mut self.hold_a,
            State::DelayA => &mut self.delay_a,
            State::MoveB => &mut self.move_b,
            State::HoldB => &mut self.hold_b,
            State::MoveC => &mut self.move_c,
            State::HoldC => &mut self.hold_c,
            State::Success => &mut self.success,
            State::Failure => &mut self.failure,
            State::Intertrial => &mut self.intertrial,
            State::Inactive | State::TrialSetup | State::TrialTeardown => return None,
        })
    }

    /// Timer duration for `state`; `None` for states that never time out
    pub fn duration(&self, state: State) -> Option<Duration> {
        self.seconds(state)
            .map(|s| Duration::try_from_secs_f64(s.max(0.0)).unwrap_or(Duration::MAX))
    }

    pub fn set(&mut self, state: State, seconds: f64) -> Result<(), ConfigError> {
        check_timeout(state, seconds)?;
        let slot = self.slot(state).ok_or(ConfigError::NotATimeout(state))?;
        *slot = seconds;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for state in State::ALL.into_iter().filter(State::has_timeout) {
            if let Some(seconds) = self.seconds(state) {
                check_timeout(state, seconds)?;
            }
        }
        Ok(())
    }
}

fn check_timeout(state: State, seconds: f64) -> Result<(), ConfigError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTimeout { state, seconds })
    }
}

/// Size and color applied to a sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereStyle {
    pub radius: f64,
    pub color: Rgba,
}

impl SphereStyle {
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius {
                name: name.to_string(),
                radius: self.radius,
            });
        }
        if !self.color.is_valid() {
            return Err(ConfigError::InvalidColor(name.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskConfig {
    pub timeouts: Timeouts,
    pub cursor: SphereStyle,
    pub target: SphereStyle,
    /// Cue color for targets that do not carry their own
    pub cue_color: Rgba,
    /// YAML or JSON target list; the built-in square is used when absent
    pub targets_path: Option<PathBuf>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            cursor: SphereStyle {
                radius: 0.1,
                color: Rgba::GREEN,
            },
            target: SphereStyle {
                radius: 0.2,
                color: Rgba::TRANSLUCENT_BLUE,
            },
            cue_color: Rgba::TRANSLUCENT_RED,
            targets_path: None,
        }
    }
}

impl TaskConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: TaskConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a YAML configuration; a relative `targets_path` is resolved
    /// against the configuration file's directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let (Some(targets), Some(dir)) = (config.targets_path.as_mut(), path.parent()) {
            if targets.is_relative() {
                *targets = dir.join(&*targets);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeouts.validate()?;
        self.cursor.validate("cursor")?;
        self.target.validate("target")?;
        if !self.cue_color.is_valid() {
            return Err(ConfigError::InvalidColor("cue".to_string()));
        }
        Ok(())
    }

    /// Applies a `STATE=SECONDS` override such as `hold_a=0.75`
    pub fn apply_override(&mut self, entry: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidOverride(entry.to_string());
        let (key, value) = entry.split_once('=').ok_or_else(invalid)?;
        let state: State = key.trim().parse().map_err(|_| invalid())?;
        let seconds: f64 = value.trim().parse().map_err(|_| invalid())?;
        self.timeouts.set(state, seconds)
    }
}
