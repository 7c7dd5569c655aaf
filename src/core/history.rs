//! Transition history tracking.
//!
//! Each handle keeps an immutable log of the transitions it has committed.
//! Recording returns a new history value; the log is serializable whenever
//! the state and trigger types are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::state::{StateValue, TriggerValue};
use crate::core::transition::Transition;

/// A committed transition: where the machine was, where it ended up, what
/// moved it, and when.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, T: Serialize",
    deserialize = "S: serde::de::DeserializeOwned, T: serde::de::DeserializeOwned"
))]
pub struct TransitionRecord<S, T> {
    /// The state being transitioned from.
    pub source: S,
    /// The state being transitioned to, after any initial-transition
    /// descent.
    pub destination: S,
    /// The trigger that caused the transition.
    pub trigger: T,
    /// When the trigger was fired.
    pub fired_at: DateTime<Utc>,
}

impl<S: StateValue, T: TriggerValue> From<&Transition<S, T>> for TransitionRecord<S, T> {
    fn from(transition: &Transition<S, T>) -> Self {
        Self {
            source: transition.source().clone(),
            destination: transition.destination().clone(),
            trigger: transition.trigger().clone(),
            fired_at: transition.fired_at(),
        }
    }
}

/// Ordered history of committed transitions.
///
/// The history is immutable: [`TransitionHistory::record`] returns a new
/// history with the record appended. Internal transitions and ignored
/// triggers leave no record, since the state does not change.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, T: Serialize",
    deserialize = "S: serde::de::DeserializeOwned, T: serde::de::DeserializeOwned"
))]
pub struct TransitionHistory<S, T> {
    records: Vec<TransitionRecord<S, T>>,
}

impl<S: StateValue, T: TriggerValue> TransitionHistory<S, T> {
    /// The empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// A new history with `record` appended.
    #[must_use]
    pub fn record(&self, record: TransitionRecord<S, T>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// The committed records, oldest first.
    pub fn records(&self) -> &[TransitionRecord<S, T>] {
        &self.records
    }

    /// The most recent record, if any.
    pub fn last(&self) -> Option<&TransitionRecord<S, T>> {
        self.records.last()
    }

    /// Number of committed transitions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The sequence of states visited: the first record's source followed by
    /// every destination. Empty for an empty history.
    pub fn path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(&first.source);
        }
        path.extend(self.records.iter().map(|r| &r.destination));
        path
    }
}

impl<S: StateValue, T: TriggerValue> Default for TransitionHistory<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
