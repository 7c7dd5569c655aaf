//! Guard conditions gating trigger behaviours.
//!
//! A guard is an ordered conjunction of named predicates over the trigger
//! arguments. Instead of stopping at the first failing condition, the unmet
//! descriptions are collected so diagnostics can report everything that
//! blocked a transition at once.

use std::fmt;
use std::sync::Arc;

use crate::core::args::TriggerArgs;

/// A pure predicate over the trigger arguments.
pub type GuardPredicate = Arc<dyn Fn(&TriggerArgs) -> bool + Send + Sync>;

/// One named condition of a guard.
#[derive(Clone)]
pub struct GuardCondition {
    predicate: GuardPredicate,
    description: String,
}

impl GuardCondition {
    /// Create a condition from a predicate and its diagnostic description.
    pub fn new<F>(predicate: F, description: impl Into<String>) -> Self
    where
        F: Fn(&TriggerArgs) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }

    /// The diagnostic description.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn holds(&self, args: &TriggerArgs) -> bool {
        (self.predicate)(args)
    }
}

impl fmt::Debug for GuardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardCondition")
            .field("description", &self.description)
            .finish()
    }
}

/// An ordered conjunction of [`GuardCondition`]s.
///
/// A guard with zero conditions always passes. Conditions are evaluated in
/// declaration order, and [`Guard::unmet`] reports failing descriptions in
/// that same order.
///
/// # Example
///
/// ```rust
/// use strata::{Guard, IntoTriggerArgs, TriggerArgs};
///
/// let guard = Guard::when(|args: &TriggerArgs| args.len() == 1, "exactly one argument")
///     .and(|args| args.get::<u32>(0).is_some_and(|n| *n > 0), "argument is positive");
///
/// assert!(guard.passes(&(3u32,).into_trigger_args()));
/// assert_eq!(
///     guard.unmet(&(0u32,).into_trigger_args()),
///     vec!["argument is positive".to_string()]
/// );
/// ```
#[derive(Clone, Default)]
pub struct Guard {
    conditions: Vec<GuardCondition>,
}

impl Guard {
    /// The guard with no conditions; always passes.
    pub fn always() -> Self {
        Self::default()
    }

    /// A guard with a single condition.
    pub fn when<F>(predicate: F, description: impl Into<String>) -> Self
    where
        F: Fn(&TriggerArgs) -> bool + Send + Sync + 'static,
    {
        Self {
            conditions: vec![GuardCondition::new(predicate, description)],
        }
    }

    /// A guard from a list of conditions.
    pub fn all(conditions: impl IntoIterator<Item = GuardCondition>) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Append one more condition.
    pub fn and<F>(mut self, predicate: F, description: impl Into<String>) -> Self
    where
        F: Fn(&TriggerArgs) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(GuardCondition::new(predicate, description));
        self
    }

    /// True iff every condition holds for `args`.
    pub fn passes(&self, args: &TriggerArgs) -> bool {
        self.conditions.iter().all(|c| c.holds(args))
    }

    /// Descriptions of the conditions that fail for `args`, in declaration
    /// order.
    pub fn unmet(&self, args: &TriggerArgs) -> Vec<String> {
        self.conditions
            .iter()
            .filter(|c| !c.holds(args))
            .map(|c| c.description.clone())
            .collect()
    }

    /// Descriptions of all conditions, in declaration order.
    pub fn descriptions(&self) -> Vec<String> {
        self.conditions.iter().map(|c| c.description.clone()).collect()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.conditions.iter().map(|c| &c.description))
            .finish()
    }
}
