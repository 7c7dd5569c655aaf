//! Fluent configuration surface.

pub mod state;

pub use state::StateBuilder;
