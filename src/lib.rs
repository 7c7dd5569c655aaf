//! Strata: a hierarchical state machine engine
//!
//! Strata lets client code declare states, triggers, substate
//! relationships, guards, entry/exit actions, and transition observers,
//! then fire triggers against a separately-owned context to drive its state
//! field through the declared graph.
//!
//! The crate follows a "pure core, imperative shell" split: the
//! configuration graph answers every structural question — which behaviour
//! handles a trigger, which states to exit and enter, which triggers are
//! permitted — as pure functions, while a [`Handle`] binds the engine to
//! one context and executes actions under a run-to-completion queue.
//!
//! # Core Concepts
//!
//! - **States and triggers**: plain client values (usually enums) with
//!   value equality and hashing
//! - **Context**: the client-owned object whose state field the engine
//!   reads and writes, via the [`StateContext`] capability
//! - **Hierarchy**: substates inherit trigger handlers from their
//!   ancestors; exit actions run innermost-first, entry actions
//!   outermost-first
//! - **Guards**: named predicate conjunctions gating each behaviour, with
//!   unmet-condition diagnostics
//!
//! # Example
//!
//! ```rust
//! use strata::{StateCell, StateMachine};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Phone {
//!     Idle,
//!     Ringing,
//!     Connected,
//! }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Call {
//!     Dial,
//!     PickUp,
//!     HangUp,
//! }
//!
//! # fn main() -> Result<(), strata::FireError<Phone, Call>> {
//! let mut machine = StateMachine::new();
//! machine.configure(Phone::Idle).permit(Call::Dial, Phone::Ringing);
//! machine
//!     .configure(Phone::Ringing)
//!     .permit(Call::PickUp, Phone::Connected)
//!     .permit(Call::HangUp, Phone::Idle);
//! machine.configure(Phone::Connected).permit(Call::HangUp, Phone::Idle);
//!
//! let mut call = machine.create_handle(StateCell::new(Phone::Idle), Phone::Idle);
//! call.fire(Call::Dial)?;
//! call.fire(Call::PickUp)?;
//! assert_eq!(call.state(), Phone::Connected);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod machine;
pub mod reflection;

// Re-export the working surface at the crate root.
pub use crate::builder::StateBuilder;
pub use crate::core::{
    Guard, GuardCondition, IntoTriggerArgs, ParameterList, ParameterSpec, StateCell, StateContext,
    StateValue, Transition, TransitionHistory, TransitionRecord, TriggerArgs, TriggerParameters,
    TriggerQueue, TriggerValue,
};
pub use crate::machine::{
    ConfigError, FireError, FiringMode, Handle, StateMachine, TriggerDetails,
};
pub use crate::reflection::{ActionInfo, StateInfo, StateMachineInfo, TransitionInfo};
