//! Trigger behaviours and action records.
//!
//! Behaviour dispatch is a tagged variant matched by the engine, and action
//! lists are vectors of callables with descriptor strings for reflection.

use std::sync::Arc;

use crate::core::args::TriggerArgs;
use crate::core::guard::Guard;
use crate::core::transition::{Transition, TriggerQueue};

/// An entry, exit, or internal-transition action: receives the context, the
/// transition being executed, and the fire capability.
pub type ActionFn<S, T, C> =
    Arc<dyn Fn(&mut C, &Transition<S, T>, &mut TriggerQueue<T>) + Send + Sync>;

/// An activation or deactivation action; receives only the context.
pub type ContextActionFn<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

/// A dynamic destination selector over the trigger arguments.
pub type SelectorFn<S> = Arc<dyn Fn(&TriggerArgs) -> S + Send + Sync>;

pub(crate) struct EntryAction<S, T, C> {
    pub(crate) callback: ActionFn<S, T, C>,
    pub(crate) description: String,
    pub(crate) from_trigger: Option<T>,
}

impl<S, T: PartialEq, C> EntryAction<S, T, C> {
    /// Whether this action runs for a transition caused by `trigger`.
    pub(crate) fn applies_to(&self, trigger: &T) -> bool {
        match &self.from_trigger {
            Some(from) => from == trigger,
            None => true,
        }
    }
}

pub(crate) struct ExitAction<S, T, C> {
    pub(crate) callback: ActionFn<S, T, C>,
    pub(crate) description: String,
}

pub(crate) struct LifecycleAction<C> {
    pub(crate) callback: ContextActionFn<C>,
    pub(crate) description: String,
}

/// What firing a trigger does, once its guard has passed.
pub(crate) enum TriggerBehaviourKind<S, T, C> {
    /// Exit up to the common ancestor, enter the destination's chain.
    Transitioning { destination: S },
    /// Leave and re-enter the destination, even when it equals the source.
    Reentry { destination: S },
    /// Run an action without exit or entry; the state does not change.
    Internal {
        action: ActionFn<S, T, C>,
        description: String,
    },
    /// Consume the trigger silently.
    Ignored,
    /// Compute the destination from the arguments, then transition.
    Dynamic {
        selector: SelectorFn<S>,
        description: String,
    },
}

pub(crate) struct TriggerBehaviour<S, T, C> {
    pub(crate) kind: TriggerBehaviourKind<S, T, C>,
    pub(crate) guard: Guard,
}

impl<S, T, C> TriggerBehaviour<S, T, C> {
    pub(crate) fn new(kind: TriggerBehaviourKind<S, T, C>, guard: Guard) -> Self {
        Self { kind, guard }
    }
}
