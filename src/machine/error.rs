//! Configuration-time and fire-time errors.

use std::fmt::Debug;

use thiserror::Error;

/// Errors raised while configuring a state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError<S: Debug, T: Debug> {
    /// The trigger's parameters were already registered.
    #[error("parameters for trigger {trigger:?} have already been configured")]
    Reconfiguration {
        /// The trigger being re-registered.
        trigger: T,
    },

    /// Declaring the substate relationship would create a cycle.
    #[error("configuring {state:?} as a substate of {parent:?} would create a cycle in the hierarchy")]
    CyclicHierarchy {
        /// The state being configured.
        state: S,
        /// The requested superstate.
        parent: S,
    },
}

/// Errors raised while firing a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError<S: Debug, T: Debug> {
    /// The wrong number of arguments was supplied for a registered trigger.
    #[error("trigger {trigger:?} expects {expected} argument(s) but {actual} were supplied")]
    ArityMismatch {
        /// The fired trigger.
        trigger: T,
        /// Registered argument count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// An argument's runtime type does not match the registered type.
    #[error("argument {index} of trigger {trigger:?} should be a {expected} but a {actual} was supplied")]
    TypeMismatch {
        /// The fired trigger.
        trigger: T,
        /// Position of the offending argument.
        index: usize,
        /// Registered type name.
        expected: &'static str,
        /// Supplied type name.
        actual: &'static str,
    },

    /// No behaviour is configured for the trigger in the current state or
    /// any of its ancestors.
    #[error("no valid transitions are permitted from state {state:?} for trigger {trigger:?}")]
    NoTransitionsPermitted {
        /// The state the machine was in.
        state: S,
        /// The fired trigger.
        trigger: T,
    },

    /// Behaviours exist for the trigger but every guard failed.
    #[error("trigger {trigger:?} is not permitted from state {state:?}; guard conditions are not met: {}", .guards.join(", "))]
    UnmetGuards {
        /// The state the machine was in.
        state: S,
        /// The fired trigger.
        trigger: T,
        /// Descriptions of the failing guard conditions.
        guards: Vec<String>,
    },

    /// More than one guard passed for the trigger within a single state.
    #[error("multiple behaviours for trigger {trigger:?} are permitted from state {state:?}; guards must be mutually exclusive")]
    MultiplePermitted {
        /// The state the machine was in.
        state: S,
        /// The fired trigger.
        trigger: T,
    },

    /// An initial-transition target turned out not to be a direct substate
    /// when the composite state was entered.
    #[error("the initial transition target {target:?} of state {state:?} is not a direct substate")]
    BadInitialTransition {
        /// The composite state being entered.
        state: S,
        /// The configured initial target.
        target: S,
    },
}
