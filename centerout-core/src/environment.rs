use crate::geometry::{HOME, Position, Rgba, distance};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the sphere the subject controls
pub const CURSOR: &str = "cursor";
/// Name of the sphere the subject must engage
pub const TARGET: &str = "target";
/// Name of the delay-period marker
pub const CUE: &str = "cue";

#[derive(Debug, Error, PartialEq)]
pub enum EnvironmentError {
    #[error("no object named '{0}' in the environment")]
    UnknownObject(String),

    #[error("object '{0}' already exists in the environment")]
    AlreadyExists(String),
}

/// Spatial environment the task manipulates: named spheres with a position,
/// radius and color.
///
/// Referencing an object that does not exist is a contract violation and
/// returns [`EnvironmentError::UnknownObject`].
pub trait Environment: Send {
    /// Adds a sphere with default attributes: unit radius, at the origin,
    /// opaque black.
    fn create(&mut self, name: &str) -> Result<(), EnvironmentError>;
    fn destroy(&mut self, name: &str) -> Result<(), EnvironmentError>;
    fn exists(&self, name: &str) -> bool;
    fn names(&self) -> Vec<String>;

    fn set_position(&mut self, name: &str, position: Position) -> Result<(), EnvironmentError>;
    fn position(&self, name: &str) -> Result<Position, EnvironmentError>;
    fn set_radius(&mut self, name: &str, radius: f64) -> Result<(), EnvironmentError>;
    fn radius(&self, name: &str) -> Result<f64, EnvironmentError>;
    fn set_color(&mut self, name: &str, color: Rgba) -> Result<(), EnvironmentError>;
    fn color(&self, name: &str) -> Result<Rgba, EnvironmentError>;

    /// True when the two spheres overlap or touch
    fn overlaps(&self, a: &str, b: &str) -> Result<bool, EnvironmentError> {
        let gap = distance(self.position(a)?, self.position(b)?);
        Ok(gap <= self.radius(a)? + self.radius(b)?)
    }

    /// True when the cursor overlaps the named sphere
    fn is_engaged(&self, name: &str) -> Result<bool, EnvironmentError> {
        self.overlaps(name, CURSOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: Position,
    pub radius: f64,
    pub color: Rgba,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: HOME,
            radius: 1.0,
            color: Rgba::BLACK,
        }
    }
}

/// In-memory sphere store; starts out holding a default cursor
#[derive(Debug, Clone)]
pub struct SphereEnvironment {
    objects: BTreeMap<String, Sphere>,
}

impl SphereEnvironment {
    pub fn new() -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(CURSOR.to_string(), Sphere::default());
        Self { objects }
    }

    pub fn sphere(&self, name: &str) -> Option<&Sphere> {
        self.objects.get(name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn get(&self, name: &str) -> Result<&Sphere, EnvironmentError> {
        self.objects
            .get(name)
            .ok_or_else(|| EnvironmentError::UnknownObject(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Sphere, EnvironmentError> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| EnvironmentError::UnknownObject(name.to_string()))
    }
}

impl Default for SphereEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SphereEnvironment {
    fn create(&mut self, name: &str) -> Result<(), EnvironmentError> {
        if self.objects.contains_key(name) {
            return Err(EnvironmentError::AlreadyExists(name.to_string()));
        }
        self.objects.insert(name.to_string(), Sphere::default());
        Ok(())
    }

    fn destroy(&mut self, name: &str) -> Result<(), EnvironmentError> {
        self.objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EnvironmentError::UnknownObject(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    fn set_position(&mut self, name: &str, position: Position) -> Result<(), EnvironmentError> {
        self.get_mut(name)?.position = position;
        Ok(())
    }

    fn position(&self, name: &str) -> Result<Position, EnvironmentError> {
        Ok(self.get(name)?.position)
    }

    fn set_radius(&mut self, name: &str, radius: f64) -> Result<(), EnvironmentError> {
        self.get_mut(name)?.radius = radius;
        Ok(())
    }

    fn radius(&self, name: &str) -> Result<f64, EnvironmentError> {
        Ok(self.get(name)?.radius)
    }

    fn set_color(&mut self, name: &str, color: Rgba) -> Result<(), EnvironmentError> {
        self.get_mut(name)?.color = color;
        Ok(())
    }

    fn color(&self, name: &str) -> Result<Rgba, EnvironmentError> {
        Ok(self.get(name)?.color)
    }
}
