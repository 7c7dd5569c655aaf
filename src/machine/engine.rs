//! The engine: configuration surface, observers, and handle creation.

use std::collections::HashMap;

use crate::builder::StateBuilder;
use crate::core::params::{ArgsMismatch, ParameterList, TriggerParameters};
use crate::core::representation::StateGraph;
use crate::core::state::{StateContext, StateValue, TriggerValue};
use crate::core::transition::Transition;
use crate::core::TriggerArgs;
use crate::machine::error::{ConfigError, FireError};
use crate::machine::handle::Handle;
use crate::reflection::{self, StateMachineInfo};

/// How nested firings are scheduled.
///
/// `Queued` is the default and the recommended mode: triggers fired from
/// inside actions join a FIFO queue and run to completion after the current
/// fire, one at a time. `Immediate` processes them synchronously inside the
/// outer fire, giving up the run-to-completion guarantee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FiringMode {
    /// FIFO run-to-completion scheduling.
    #[default]
    Queued,
    /// Synchronous nested firing.
    Immediate,
}

/// An ordered transition observer.
pub type TransitionObserver<S, T> = Box<dyn Fn(&Transition<S, T>) + Send + Sync>;

/// Policy invoked when no behaviour handles a fired trigger. The default
/// policy fails with [`FireError::UnmetGuards`] when guards blocked the
/// trigger and [`FireError::NoTransitionsPermitted`] otherwise.
pub type UnhandledTriggerPolicy<S, T> =
    Box<dyn Fn(&S, &T, &[String]) -> Result<(), FireError<S, T>> + Send + Sync>;

/// A hierarchical state machine: the declared states, their behaviours, and
/// the global dispatch policy.
///
/// The engine itself holds no current state. Configuration happens through
/// `&mut self`; firing happens through a [`Handle`], which borrows the
/// engine immutably and binds it to one context. One engine can serve many
/// handles, and while any handle exists the configuration cannot change.
pub struct StateMachine<S: std::fmt::Debug, T: std::fmt::Debug, C> {
    graph: StateGraph<S, T, C>,
    trigger_parameters: HashMap<T, TriggerParameters<T>>,
    firing_mode: FiringMode,
    on_transitioned: Vec<TransitionObserver<S, T>>,
    on_transition_completed: Vec<TransitionObserver<S, T>>,
    unhandled_trigger: Option<UnhandledTriggerPolicy<S, T>>,
    retain_sync_context: bool,
}

impl<S: StateValue, T: TriggerValue, C> StateMachine<S, T, C> {
    /// A machine with no states configured, in [`FiringMode::Queued`].
    pub fn new() -> Self {
        Self::with_firing_mode(FiringMode::default())
    }

    /// A machine with an explicit firing mode.
    pub fn with_firing_mode(firing_mode: FiringMode) -> Self {
        Self {
            graph: StateGraph::new(),
            trigger_parameters: HashMap::new(),
            firing_mode,
            on_transitioned: Vec::new(),
            on_transition_completed: Vec::new(),
            unhandled_trigger: None,
            retain_sync_context: false,
        }
    }

    /// The configured firing mode.
    pub fn firing_mode(&self) -> FiringMode {
        self.firing_mode
    }

    /// Begin (or resume) configuring `state`.
    pub fn configure(&mut self, state: S) -> StateBuilder<'_, S, T, C> {
        StateBuilder::new(self, state)
    }

    /// Register the argument types required when firing `trigger`, given as
    /// a tuple type of zero to three elements, and return the stored
    /// descriptor.
    ///
    /// Fails with [`ConfigError::Reconfiguration`] if the trigger is
    /// already registered.
    pub fn set_trigger_parameters<P: ParameterList>(
        &mut self,
        trigger: T,
    ) -> Result<&TriggerParameters<T>, ConfigError<S, T>> {
        if self.trigger_parameters.contains_key(&trigger) {
            return Err(ConfigError::Reconfiguration { trigger });
        }
        let params = TriggerParameters::new(trigger.clone(), P::specs());
        Ok(self.trigger_parameters.entry(trigger).or_insert(params))
    }

    /// The registered parameter descriptor for `trigger`, if any.
    pub fn trigger_parameters(&self, trigger: &T) -> Option<&TriggerParameters<T>> {
        self.trigger_parameters.get(trigger)
    }

    /// Register an observer invoked after exit actions and the state write,
    /// just before entry actions start. Observers run in registration
    /// order.
    pub fn on_transitioned<F>(&mut self, observer: F)
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        self.on_transitioned.push(Box::new(observer));
    }

    /// Register an observer invoked after all entry actions and initial
    /// descents, with the final destination. Observers run in registration
    /// order.
    pub fn on_transition_completed<F>(&mut self, observer: F)
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        self.on_transition_completed.push(Box::new(observer));
    }

    /// Replace the unhandled-trigger policy. The policy receives the
    /// current state, the trigger, and the unmet guard descriptions; it may
    /// swallow the trigger by returning `Ok(())`.
    pub fn on_unhandled_trigger<F>(&mut self, policy: F)
    where
        F: Fn(&S, &T, &[String]) -> Result<(), FireError<S, T>> + Send + Sync + 'static,
    {
        self.unhandled_trigger = Some(Box::new(policy));
    }

    /// Set the opaque host-bridge flag handed through to action
    /// invocations. The engine does not interpret it.
    pub fn retain_synchronization_context(&mut self, retain: bool) {
        self.retain_sync_context = retain;
    }

    /// The opaque host-bridge flag.
    pub fn retains_synchronization_context(&self) -> bool {
        self.retain_sync_context
    }

    /// Bind the engine to one context, writing `initial_state` into the
    /// context's state field.
    pub fn create_handle(&self, context: C, initial_state: S) -> Handle<'_, S, T, C>
    where
        C: StateContext<S>,
    {
        Handle::new(self, context, initial_state)
    }

    /// A snapshot of the configured graph for diagram generators, rooted at
    /// `initial_state`.
    pub fn get_info(&self, initial_state: S) -> StateMachineInfo<S, T> {
        reflection::build_info(self, initial_state)
    }

    pub(crate) fn graph(&self) -> &StateGraph<S, T, C> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut StateGraph<S, T, C> {
        &mut self.graph
    }

    pub(crate) fn validate_trigger_args(
        &self,
        trigger: &T,
        args: &TriggerArgs,
    ) -> Result<(), FireError<S, T>> {
        let Some(params) = self.trigger_parameters.get(trigger) else {
            return Ok(());
        };
        params.validate(args).map_err(|mismatch| match mismatch {
            ArgsMismatch::Arity { expected, actual } => FireError::ArityMismatch {
                trigger: trigger.clone(),
                expected,
                actual,
            },
            ArgsMismatch::Type {
                index,
                expected,
                actual,
            } => FireError::TypeMismatch {
                trigger: trigger.clone(),
                index,
                expected,
                actual,
            },
        })
    }

    pub(crate) fn unhandled(
        &self,
        state: &S,
        trigger: &T,
        unmet: &[String],
    ) -> Result<(), FireError<S, T>> {
        match &self.unhandled_trigger {
            Some(policy) => policy(state, trigger, unmet),
            None if unmet.is_empty() => Err(FireError::NoTransitionsPermitted {
                state: state.clone(),
                trigger: trigger.clone(),
            }),
            None => Err(FireError::UnmetGuards {
                state: state.clone(),
                trigger: trigger.clone(),
                guards: unmet.to_vec(),
            }),
        }
    }

    pub(crate) fn notify_transitioned(&self, transition: &Transition<S, T>) {
        for observer in &self.on_transitioned {
            observer(transition);
        }
    }

    pub(crate) fn notify_completed(&self, transition: &Transition<S, T>) {
        for observer in &self.on_transition_completed {
            observer(transition);
        }
    }
}

impl<S: StateValue, T: TriggerValue, C> Default for StateMachine<S, T, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StateCell;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum State {
        A,
        B,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum Trigger {
        Go,
    }

    type Machine = StateMachine<State, Trigger, StateCell<State>>;

    #[test]
    fn firing_mode_defaults_to_queued() {
        let machine = Machine::new();
        assert_eq!(machine.firing_mode(), FiringMode::Queued);

        let machine = Machine::with_firing_mode(FiringMode::Immediate);
        assert_eq!(machine.firing_mode(), FiringMode::Immediate);
    }

    #[test]
    fn trigger_parameters_cannot_be_reconfigured() {
        let mut machine = Machine::new();
        machine
            .set_trigger_parameters::<(String,)>(Trigger::Go)
            .unwrap();

        assert!(matches!(
            machine.set_trigger_parameters::<(String,)>(Trigger::Go),
            Err(ConfigError::Reconfiguration {
                trigger: Trigger::Go
            })
        ));
    }

    #[test]
    fn unregistered_triggers_skip_validation() {
        let machine = Machine::new();
        let args = crate::core::args::IntoTriggerArgs::into_trigger_args((42u8,));
        assert!(machine.validate_trigger_args(&Trigger::Go, &args).is_ok());
    }

    #[test]
    fn default_unhandled_policy_distinguishes_unmet_guards() {
        let machine = Machine::new();

        assert!(matches!(
            machine.unhandled(&State::A, &Trigger::Go, &[]),
            Err(FireError::NoTransitionsPermitted { .. })
        ));
        assert!(matches!(
            machine.unhandled(&State::A, &Trigger::Go, &["blocked".to_string()]),
            Err(FireError::UnmetGuards { .. })
        ));
    }

    #[test]
    fn a_custom_policy_may_swallow_triggers() {
        let mut machine = Machine::new();
        machine.on_unhandled_trigger(|_, _, _| Ok(()));
        assert!(machine.unhandled(&State::B, &Trigger::Go, &[]).is_ok());
    }

    #[test]
    fn retain_synchronization_context_is_stored_opaquely() {
        let mut machine = Machine::new();
        assert!(!machine.retains_synchronization_context());
        machine.retain_synchronization_context(true);
        assert!(machine.retains_synchronization_context());
    }
}
