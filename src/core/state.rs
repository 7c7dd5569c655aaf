//! Core contracts for state values, trigger values, and contexts.
//!
//! The engine never interprets states or triggers; it only compares, hashes,
//! and clones them. The context is the client-owned object whose state field
//! the engine reads and writes, and [`StateContext`] is its sole contract.

use std::fmt::Debug;
use std::hash::Hash;

/// Requirements on a state value.
///
/// States are opaque values used as map keys: they must support value
/// equality, hashing, cloning, and debug formatting. The trait is
/// blanket-implemented, so any suitable type (typically a plain enum)
/// qualifies without an explicit impl.
///
/// # Example
///
/// ```rust
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum DoorState {
///     Open,
///     Closed,
/// }
/// // DoorState already implements strata::StateValue.
/// fn assert_state_value<S: strata::StateValue>() {}
/// assert_state_value::<DoorState>();
/// ```
pub trait StateValue: Clone + Eq + Hash + Debug {}

impl<S: Clone + Eq + Hash + Debug> StateValue for S {}

/// Requirements on a trigger value. Identical to [`StateValue`];
/// blanket-implemented.
pub trait TriggerValue: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> TriggerValue for T {}

/// The context capability: a gettable and settable state field.
///
/// The context belongs to the client and may carry arbitrary domain data;
/// the engine only requires access to the one field of type `S` that holds
/// the current state. Entry, exit, and internal-transition actions receive
/// the context mutably and may update its other fields freely.
///
/// # Example
///
/// ```rust
/// use strata::StateContext;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum BugState {
///     Open,
///     Closed,
/// }
///
/// struct Bug {
///     state: BugState,
///     title: String,
/// }
///
/// impl StateContext<BugState> for Bug {
///     fn state(&self) -> BugState {
///         self.state.clone()
///     }
///
///     fn set_state(&mut self, state: BugState) {
///         self.state = state;
///     }
/// }
/// ```
pub trait StateContext<S> {
    /// Read the current state.
    fn state(&self) -> S;

    /// Overwrite the current state.
    fn set_state(&mut self, state: S);
}

/// A minimal context that is nothing but the state field.
///
/// Useful for clients that have no domain object of their own, and for
/// tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateCell<S> {
    state: S,
}

impl<S> StateCell<S> {
    /// Create a cell holding `state`.
    pub fn new(state: S) -> Self {
        Self { state }
    }
}

impl<S: Clone> StateContext<S> for StateCell<S> {
    fn state(&self) -> S {
        self.state.clone()
    }

    fn set_state(&mut self, state: S) {
        self.state = state;
    }
}
