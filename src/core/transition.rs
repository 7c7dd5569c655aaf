//! Transition records and the fire capability handed to actions.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::args::{IntoTriggerArgs, TriggerArgs};
use crate::core::state::{StateValue, TriggerValue};

/// An immutable record of one transition being executed.
///
/// Actions and observers receive the transition by reference; the argument
/// list is shared, never null, and empty for parameterless triggers.
#[derive(Clone)]
pub struct Transition<S, T> {
    source: S,
    destination: S,
    trigger: T,
    args: TriggerArgs,
    fired_at: DateTime<Utc>,
    initial: bool,
}

impl<S: StateValue, T: TriggerValue> Transition<S, T> {
    pub(crate) fn new(source: S, destination: S, trigger: T, args: TriggerArgs) -> Self {
        Self {
            source,
            destination,
            trigger,
            args,
            fired_at: Utc::now(),
            initial: false,
        }
    }

    /// A synthetic transition produced by an initial-transition descent into
    /// a substate.
    pub(crate) fn initial(source: S, destination: S, trigger: T, args: TriggerArgs) -> Self {
        Self {
            initial: true,
            ..Self::new(source, destination, trigger, args)
        }
    }

    pub(crate) fn with_source(&self, source: S) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    pub(crate) fn with_destination(&self, destination: S) -> Self {
        Self {
            destination,
            ..self.clone()
        }
    }

    /// The state the transition leaves.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The state the transition enters.
    pub fn destination(&self) -> &S {
        &self.destination
    }

    /// The trigger that caused the transition.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// The arguments the trigger was fired with.
    pub fn args(&self) -> &TriggerArgs {
        &self.args
    }

    /// When the trigger was fired.
    pub fn fired_at(&self) -> DateTime<Utc> {
        self.fired_at
    }

    /// True iff source and destination are the same state.
    pub fn is_reentry(&self) -> bool {
        self.source == self.destination
    }

    /// True for the synthetic transitions of initial-transition descents.
    pub fn is_initial(&self) -> bool {
        self.initial
    }
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for Transition<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("trigger", &self.trigger)
            .field("args", &self.args)
            .field("fired_at", &self.fired_at)
            .finish()
    }
}

/// The fire capability passed to actions.
///
/// Actions may not call back into the handle they run under, so further
/// firings are requested through this queue instead. Under
/// [`FiringMode::Queued`](crate::FiringMode::Queued) the requests join the
/// run-to-completion queue and are processed after the current fire
/// finishes; under [`FiringMode::Immediate`](crate::FiringMode::Immediate)
/// they are processed synchronously as soon as the action returns.
pub struct TriggerQueue<T> {
    requests: VecDeque<(T, TriggerArgs)>,
    retain_sync_context: bool,
}

impl<T> TriggerQueue<T> {
    pub(crate) fn new(retain_sync_context: bool) -> Self {
        Self {
            requests: VecDeque::new(),
            retain_sync_context,
        }
    }

    /// Request a parameterless fire.
    pub fn fire(&mut self, trigger: T) {
        self.requests.push_back((trigger, TriggerArgs::empty()));
    }

    /// Request a parameterised fire.
    pub fn fire_with(&mut self, trigger: T, args: impl IntoTriggerArgs) {
        self.requests.push_back((trigger, args.into_trigger_args()));
    }

    /// True when no firings have been requested.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// The opaque host-bridge flag configured on the engine. The engine
    /// never interprets it.
    pub fn retains_synchronization_context(&self) -> bool {
        self.retain_sync_context
    }

    pub(crate) fn into_requests(self) -> VecDeque<(T, TriggerArgs)> {
        self.requests
    }
}
