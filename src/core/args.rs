//! Dynamically-typed trigger argument tuples.
//!
//! Parameterised triggers carry positional arguments whose types are only
//! known to the client. [`TriggerArgs`] stores them as type-erased values,
//! each stamped at construction with its `TypeId` and type name so the
//! engine can validate them against a registered parameter descriptor and
//! report mismatches by name.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub(crate) struct ArgValue {
    value: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ArgValue {
    fn of<A: Any + Send + Sync>(value: A) -> Self {
        Self {
            value: Box::new(value),
            type_id: TypeId::of::<A>(),
            type_name: std::any::type_name::<A>(),
        }
    }
}

/// An immutable, cheaply cloneable list of trigger arguments.
///
/// Cloning shares the underlying values; the list held by a fired
/// transition is the same list its guards, selector, and actions observe.
/// Never null: a parameterless fire carries [`TriggerArgs::empty`].
///
/// # Example
///
/// ```rust
/// use strata::{IntoTriggerArgs, TriggerArgs};
///
/// let args = ("alice".to_string(), 3u32).into_trigger_args();
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<String>(0).unwrap(), "alice");
/// assert_eq!(*args.get::<u32>(1).unwrap(), 3);
/// assert!(args.get::<u32>(0).is_none());
/// ```
#[derive(Clone, Default)]
pub struct TriggerArgs {
    values: Arc<Vec<ArgValue>>,
}

impl TriggerArgs {
    /// The empty argument list.
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_values(values: Vec<ArgValue>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed access to the argument at `index`. Returns `None` when the
    /// index is out of range or the stored value is not an `A`.
    pub fn get<A: Any>(&self, index: usize) -> Option<&A> {
        self.values.get(index)?.value.downcast_ref()
    }

    pub(crate) fn type_id_at(&self, index: usize) -> Option<TypeId> {
        self.values.get(index).map(|v| v.type_id)
    }

    pub(crate) fn type_name_at(&self, index: usize) -> Option<&'static str> {
        self.values.get(index).map(|v| v.type_name)
    }
}

impl fmt::Debug for TriggerArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|v| v.type_name))
            .finish()
    }
}

/// Conversion of Rust tuples (zero to three elements) into [`TriggerArgs`].
///
/// This is how the parameterised `fire` overloads are spelled in Rust:
/// `handle.fire_with(trigger, (arg,))`, `(a, b)`, or `(a, b, c)`.
pub trait IntoTriggerArgs {
    /// Perform the conversion.
    fn into_trigger_args(self) -> TriggerArgs;
}

impl IntoTriggerArgs for TriggerArgs {
    fn into_trigger_args(self) -> TriggerArgs {
        self
    }
}

impl IntoTriggerArgs for () {
    fn into_trigger_args(self) -> TriggerArgs {
        TriggerArgs::empty()
    }
}

impl<A: Any + Send + Sync> IntoTriggerArgs for (A,) {
    fn into_trigger_args(self) -> TriggerArgs {
        TriggerArgs::from_values(vec![ArgValue::of(self.0)])
    }
}

impl<A: Any + Send + Sync, B: Any + Send + Sync> IntoTriggerArgs for (A, B) {
    fn into_trigger_args(self) -> TriggerArgs {
        TriggerArgs::from_values(vec![ArgValue::of(self.0), ArgValue::of(self.1)])
    }
}

impl<A: Any + Send + Sync, B: Any + Send + Sync, C: Any + Send + Sync> IntoTriggerArgs
    for (A, B, C)
{
    fn into_trigger_args(self) -> TriggerArgs {
        TriggerArgs::from_values(vec![
            ArgValue::of(self.0),
            ArgValue::of(self.1),
            ArgValue::of(self.2),
        ])
    }
}
