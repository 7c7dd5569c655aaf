//! The imperative shell: the engine, its handles, and the error types.

pub mod engine;
pub mod error;
pub mod handle;

pub use engine::{FiringMode, StateMachine, TransitionObserver, UnhandledTriggerPolicy};
pub use error::{ConfigError, FireError};
pub use handle::{Handle, TriggerDetails};
