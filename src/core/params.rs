//! Trigger parameter registry.
//!
//! A trigger may be registered with an ordered list of argument types; every
//! subsequent fire of that trigger is validated against the list. Triggers
//! that are never registered stay untyped and skip validation.

use std::any::{Any, TypeId};

use serde::Serialize;

use crate::core::args::TriggerArgs;
use crate::core::state::TriggerValue;

/// One expected argument position: the type's id plus its printable name.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ParameterSpec {
    #[serde(skip)]
    pub(crate) type_id: TypeId,
    /// Printable name of the expected type.
    pub type_name: &'static str,
}

impl ParameterSpec {
    /// The spec for one argument of type `A`.
    pub fn of<A: Any>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            type_name: std::any::type_name::<A>(),
        }
    }
}

/// Tuples that describe a trigger's expected argument types, zero to three
/// positions: `()`, `(A,)`, `(A, B)`, `(A, B, C)`.
pub trait ParameterList {
    /// The ordered argument specs.
    fn specs() -> Vec<ParameterSpec>;
}

impl ParameterList for () {
    fn specs() -> Vec<ParameterSpec> {
        Vec::new()
    }
}

impl<A: Any> ParameterList for (A,) {
    fn specs() -> Vec<ParameterSpec> {
        vec![ParameterSpec::of::<A>()]
    }
}

impl<A: Any, B: Any> ParameterList for (A, B) {
    fn specs() -> Vec<ParameterSpec> {
        vec![ParameterSpec::of::<A>(), ParameterSpec::of::<B>()]
    }
}

impl<A: Any, B: Any, C: Any> ParameterList for (A, B, C) {
    fn specs() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::of::<A>(),
            ParameterSpec::of::<B>(),
            ParameterSpec::of::<C>(),
        ]
    }
}

/// Validation failure, converted by the engine into a fire error carrying
/// the trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArgsMismatch {
    Arity {
        expected: usize,
        actual: usize,
    },
    Type {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
}

/// The registered parameter descriptor for one trigger.
#[derive(Clone, Debug)]
pub struct TriggerParameters<T> {
    trigger: T,
    specs: Vec<ParameterSpec>,
}

impl<T: TriggerValue> TriggerParameters<T> {
    pub(crate) fn new(trigger: T, specs: Vec<ParameterSpec>) -> Self {
        Self { trigger, specs }
    }

    /// The trigger this descriptor belongs to.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// The expected argument specs, in positional order.
    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub(crate) fn validate(&self, args: &TriggerArgs) -> Result<(), ArgsMismatch> {
        if args.len() != self.specs.len() {
            return Err(ArgsMismatch::Arity {
                expected: self.specs.len(),
                actual: args.len(),
            });
        }
        for (index, spec) in self.specs.iter().enumerate() {
            if args.type_id_at(index) != Some(spec.type_id) {
                return Err(ArgsMismatch::Type {
                    index,
                    expected: spec.type_name,
                    actual: args.type_name_at(index).unwrap_or("<missing>"),
                });
            }
        }
        Ok(())
    }
}
