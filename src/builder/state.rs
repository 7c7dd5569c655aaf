//! Fluent per-state configuration.

use std::any::type_name;
use std::sync::Arc;

use crate::core::behaviour::{
    EntryAction, ExitAction, LifecycleAction, TriggerBehaviour, TriggerBehaviourKind,
};
use crate::core::guard::Guard;
use crate::core::state::{StateValue, TriggerValue};
use crate::core::transition::{Transition, TriggerQueue};
use crate::core::TriggerArgs;
use crate::machine::engine::StateMachine;
use crate::machine::error::ConfigError;

/// Configures one state of a [`StateMachine`].
///
/// Obtained from [`StateMachine::configure`]; every operation is additive,
/// and a state may be configured in several passes. Re-declaring a permit
/// for the same trigger stacks another guarded behaviour, evaluated in
/// declaration order.
pub struct StateBuilder<'m, S: StateValue, T: TriggerValue, C> {
    machine: &'m mut StateMachine<S, T, C>,
    state: S,
}

impl<'m, S: StateValue, T: TriggerValue, C> StateBuilder<'m, S, T, C> {
    pub(crate) fn new(machine: &'m mut StateMachine<S, T, C>, state: S) -> Self {
        machine.graph_mut().ensure(&state);
        Self { machine, state }
    }

    /// The state being configured.
    pub fn state(&self) -> &S {
        &self.state
    }

    fn add_behaviour(&mut self, trigger: T, behaviour: TriggerBehaviour<S, T, C>) {
        self.machine
            .graph_mut()
            .ensure(&self.state)
            .add_behaviour(trigger, behaviour);
    }

    /// On `trigger`, transition to `destination`.
    pub fn permit(self, trigger: T, destination: S) -> Self {
        self.permit_if(trigger, destination, Guard::always())
    }

    /// On `trigger`, transition to `destination` when `guard` passes.
    pub fn permit_if(mut self, trigger: T, destination: S, guard: Guard) -> Self {
        self.machine.graph_mut().ensure(&destination);
        self.add_behaviour(
            trigger,
            TriggerBehaviour::new(TriggerBehaviourKind::Transitioning { destination }, guard),
        );
        self
    }

    /// On `trigger`, exit and re-enter this state.
    pub fn permit_reentry(self, trigger: T) -> Self {
        self.permit_reentry_if(trigger, Guard::always())
    }

    /// On `trigger`, exit and re-enter this state when `guard` passes.
    pub fn permit_reentry_if(mut self, trigger: T, guard: Guard) -> Self {
        let destination = self.state.clone();
        self.add_behaviour(
            trigger,
            TriggerBehaviour::new(TriggerBehaviourKind::Reentry { destination }, guard),
        );
        self
    }

    /// Consume `trigger` silently.
    pub fn ignore(self, trigger: T) -> Self {
        self.ignore_if(trigger, Guard::always())
    }

    /// Consume `trigger` silently when `guard` passes.
    pub fn ignore_if(mut self, trigger: T, guard: Guard) -> Self {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::new(TriggerBehaviourKind::Ignored, guard),
        );
        self
    }

    /// On `trigger`, run `action` without exiting or entering any state.
    pub fn internal_transition<F>(self, trigger: T, action: F) -> Self
    where
        F: Fn(&mut C, &Transition<S, T>, &mut TriggerQueue<T>) + Send + Sync + 'static,
    {
        self.internal_transition_if(trigger, Guard::always(), action)
    }

    /// On `trigger`, run `action` without exit or entry when `guard`
    /// passes.
    pub fn internal_transition_if<F>(mut self, trigger: T, guard: Guard, action: F) -> Self
    where
        F: Fn(&mut C, &Transition<S, T>, &mut TriggerQueue<T>) + Send + Sync + 'static,
    {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::new(
                TriggerBehaviourKind::Internal {
                    action: Arc::new(action),
                    description: type_name::<F>().to_string(),
                },
                guard,
            ),
        );
        self
    }

    /// On `trigger`, transition to the state `selector` computes from the
    /// arguments.
    pub fn permit_dynamic<F>(self, trigger: T, selector: F) -> Self
    where
        F: Fn(&TriggerArgs) -> S + Send + Sync + 'static,
    {
        self.permit_dynamic_if(trigger, Guard::always(), selector)
    }

    /// On `trigger`, transition to the computed state when `guard` passes.
    pub fn permit_dynamic_if<F>(mut self, trigger: T, guard: Guard, selector: F) -> Self
    where
        F: Fn(&TriggerArgs) -> S + Send + Sync + 'static,
    {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::new(
                TriggerBehaviourKind::Dynamic {
                    selector: Arc::new(selector),
                    description: type_name::<F>().to_string(),
                },
                guard,
            ),
        );
        self
    }

    /// Declare this state a substate of `parent`.
    ///
    /// Fails with [`ConfigError::CyclicHierarchy`] when the relationship
    /// would make a state its own ancestor. Re-parenting replaces the
    /// previous superstate.
    pub fn substate_of(self, parent: S) -> Result<Self, ConfigError<S, T>> {
        if self.state == parent || self.machine.graph().is_within(&parent, &self.state) {
            return Err(ConfigError::CyclicHierarchy {
                state: self.state.clone(),
                parent,
            });
        }

        let graph = self.machine.graph_mut();
        if let Some(previous) = graph.ensure(&self.state).clear_superstate() {
            graph.ensure(&previous).remove_substate(&self.state);
        }
        graph.ensure(&self.state).set_superstate(parent.clone());
        graph.ensure(&parent).add_substate(self.state.clone());
        Ok(self)
    }

    /// After entering this state, automatically descend into `target`.
    ///
    /// The target must be a direct substate by the time the state is
    /// entered; this is checked at fire time.
    pub fn initial_transition(self, target: S) -> Self {
        let graph = self.machine.graph_mut();
        graph.ensure(&target);
        graph.ensure(&self.state).set_initial_target(target);
        self
    }

    /// Run `action` whenever this state is entered.
    pub fn on_entry<F>(self, action: F) -> Self
    where
        F: Fn(&mut C, &Transition<S, T>, &mut TriggerQueue<T>) + Send + Sync + 'static,
    {
        self.machine
            .graph_mut()
            .ensure(&self.state)
            .add_entry_action(EntryAction {
                callback: Arc::new(action),
                description: type_name::<F>().to_string(),
                from_trigger: None,
            });
        self
    }

    /// Run `action` when this state is entered via `trigger`.
    pub fn on_entry_from<F>(self, trigger: T, action: F) -> Self
    where
        F: Fn(&mut C, &Transition<S, T>, &mut TriggerQueue<T>) + Send + Sync + 'static,
    {
        self.machine
            .graph_mut()
            .ensure(&self.state)
            .add_entry_action(EntryAction {
                callback: Arc::new(action),
                description: type_name::<F>().to_string(),
                from_trigger: Some(trigger),
            });
        self
    }

    /// Run `action` whenever this state is exited.
    pub fn on_exit<F>(self, action: F) -> Self
    where
        F: Fn(&mut C, &Transition<S, T>, &mut TriggerQueue<T>) + Send + Sync + 'static,
    {
        self.machine
            .graph_mut()
            .ensure(&self.state)
            .add_exit_action(ExitAction {
                callback: Arc::new(action),
                description: type_name::<F>().to_string(),
            });
        self
    }

    /// Run `action` when a handle in this state is activated.
    pub fn on_activate<F>(self, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.machine
            .graph_mut()
            .ensure(&self.state)
            .add_activate_action(LifecycleAction {
                callback: Arc::new(action),
                description: type_name::<F>().to_string(),
            });
        self
    }

    /// Run `action` when a handle in this state is deactivated.
    pub fn on_deactivate<F>(self, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.machine
            .graph_mut()
            .ensure(&self.state)
            .add_deactivate_action(LifecycleAction {
                callback: Arc::new(action),
                description: type_name::<F>().to_string(),
            });
        self
    }
}
