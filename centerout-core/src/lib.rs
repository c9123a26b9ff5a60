pub mod environment;
pub mod geometry;
pub mod state;
pub mod transition;

pub use environment::{CUE, CURSOR, Environment, EnvironmentError, SphereEnvironment, TARGET};
pub use geometry::{HOME, Position, Rgba, distance};
pub use state::{State, Trigger};
pub use transition::{Source, Transition, TransitionTable};
