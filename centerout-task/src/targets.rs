use crate::error::ConfigError;
use centerout_core::{Position, Rgba};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One outer target record. Radius and color fall back to the task
/// configuration when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

impl Target {
    pub const fn at(position: Position) -> Self {
        Self {
            position,
            radius: None,
            color: None,
        }
    }
}

/// Outer targets at the corners and faces of a square around the origin
const DEFAULT_POSITIONS: [Position; 8] = [
    (1.0, 0.0, 0.0),
    (0.0, 1.0, 0.0),
    (1.0, 1.0, 0.0),
    (-1.0, 0.0, 0.0),
    (0.0, -1.0, 0.0),
    (-1.0, -1.0, 0.0),
    (1.0, -1.0, 0.0),
    (-1.0, 1.0, 0.0),
];

/// Non-empty, ordered list of targets a trial draws from
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new(targets: Vec<Target>) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::EmptyTargets);
        }
        for (idx, target) in targets.iter().enumerate() {
            if let Some(radius) = target.radius {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(ConfigError::InvalidRadius {
                        name: format!("target {idx}"),
                        radius,
                    });
                }
            }
            if target.color.is_some_and(|c| !c.is_valid()) {
                return Err(ConfigError::InvalidColor(format!("target {idx}")));
            }
        }
        Ok(Self { targets })
    }

    /// Reads a YAML (`.yaml`/`.yml`) or JSON (`.json`) list of target records
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let targets: Vec<Target> = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        Self::new(targets)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// Uniformly random index into the set
    pub fn choose<R: Rng>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.targets.len())
    }
}

impl Default for TargetSet {
    fn default() -> Self {
        Self {
            targets: DEFAULT_POSITIONS.into_iter().map(Target::at).collect(),
        }
    }
}
