use serde::{Deserialize, Serialize};

/// Cartesian position in the task space
pub type Position = (f64, f64, f64);

/// Center or "home" position targets return to between outer visits
pub const HOME: Position = (0.0, 0.0, 0.0);

/// Euclidean distance between two positions
pub fn distance(a: Position, b: Position) -> f64 {
    let (dx, dy, dz) = (a.0 - b.0, a.1 - b.1, a.2 - b.2);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// RGBA color, channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);
    pub const TRANSLUCENT_BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 0.5);
    pub const TRANSLUCENT_RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 0.5);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.r, self.g, self.b, self.a)
    }

    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b, self.a]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(HOME, (3.0, 4.0, 0.0)), 5.0);
        assert_eq!(distance((1.0, 1.0, 1.0), (1.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn color_channels_must_be_unit_interval() {
        assert!(Rgba::TRANSLUCENT_RED.is_valid());
        assert!(!Rgba::new(0.0, 1.5, 0.0, 1.0).is_valid());
    }
}
