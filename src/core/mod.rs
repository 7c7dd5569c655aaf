//! The pure side of the engine: value contracts, guards, argument tuples,
//! behaviour tables, and the structural resolution logic.

pub mod args;
pub mod behaviour;
pub mod guard;
pub mod history;
pub mod params;
pub mod representation;
pub mod state;
pub mod transition;

pub use args::{IntoTriggerArgs, TriggerArgs};
pub use behaviour::{ActionFn, ContextActionFn, SelectorFn};
pub use guard::{Guard, GuardCondition, GuardPredicate};
pub use history::{TransitionHistory, TransitionRecord};
pub use params::{ParameterList, ParameterSpec, TriggerParameters};
pub use state::{StateCell, StateContext, StateValue, TriggerValue};
pub use transition::{Transition, TriggerQueue};
