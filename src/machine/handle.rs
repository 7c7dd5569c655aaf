//! The handle: one engine bound to one context, and the dispatch loop.
//!
//! All firing goes through a handle. The engine stays immutable for the
//! whole fire; the handle owns everything that changes — the context, the
//! run-to-completion queue, the firing and activation flags, and the
//! transition history.

use std::collections::VecDeque;

use crate::core::args::{IntoTriggerArgs, TriggerArgs};
use crate::core::behaviour::{ActionFn, LifecycleAction, TriggerBehaviourKind};
use crate::core::history::{TransitionHistory, TransitionRecord};
use crate::core::params::ParameterSpec;
use crate::core::representation::HandlerResolution;
use crate::core::state::{StateContext, StateValue, TriggerValue};
use crate::core::transition::{Transition, TriggerQueue};
use crate::machine::engine::{FiringMode, StateMachine};
use crate::machine::error::FireError;
use crate::reflection::StateMachineInfo;

/// A permitted trigger together with its registered parameter descriptor.
#[derive(Clone, Debug)]
pub struct TriggerDetails<T> {
    /// The permitted trigger.
    pub trigger: T,
    /// Registered argument specs; empty for untyped triggers.
    pub parameters: Vec<ParameterSpec>,
}

/// A binding of an engine to one context instance.
///
/// Construction writes the initial state into the context's state field.
/// The handle owns the context; get it back with [`Handle::into_context`].
pub struct Handle<'m, S: StateValue, T: TriggerValue, C> {
    machine: &'m StateMachine<S, T, C>,
    context: C,
    initial_state: S,
    queue: VecDeque<(T, TriggerArgs)>,
    firing: bool,
    active: bool,
    history: TransitionHistory<S, T>,
}

impl<'m, S: StateValue, T: TriggerValue, C: StateContext<S>> Handle<'m, S, T, C> {
    pub(crate) fn new(machine: &'m StateMachine<S, T, C>, mut context: C, initial_state: S) -> Self {
        context.set_state(initial_state.clone());
        Self {
            machine,
            context,
            initial_state,
            queue: VecDeque::new(),
            firing: false,
            active: false,
            history: TransitionHistory::new(),
        }
    }

    /// The current state, read from the context.
    pub fn state(&self) -> S {
        self.context.state()
    }

    /// The bound context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// The bound context, mutably.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consume the handle, returning the context.
    pub fn into_context(self) -> C {
        self.context
    }

    /// The engine this handle fires against.
    pub fn machine(&self) -> &'m StateMachine<S, T, C> {
        self.machine
    }

    /// The transitions this handle has committed, oldest first.
    pub fn history(&self) -> &TransitionHistory<S, T> {
        &self.history
    }

    /// True iff the current state equals `state` or lies within it.
    pub fn is_in_state(&self, state: &S) -> bool {
        self.machine.graph().is_within(&self.context.state(), state)
    }

    /// Fire a parameterless trigger.
    pub fn fire(&mut self, trigger: T) -> Result<(), FireError<S, T>> {
        self.internal_fire(trigger, TriggerArgs::empty())
    }

    /// Fire a trigger with arguments, given as a tuple of one to three
    /// elements.
    pub fn fire_with(
        &mut self,
        trigger: T,
        args: impl IntoTriggerArgs,
    ) -> Result<(), FireError<S, T>> {
        self.internal_fire(trigger, args.into_trigger_args())
    }

    /// Whether firing `trigger` (with no arguments) would be handled.
    ///
    /// Fails with [`FireError::MultiplePermitted`] on ambiguous
    /// configuration, like a real fire would.
    pub fn can_fire(&self, trigger: &T) -> Result<bool, FireError<S, T>> {
        self.can_fire_detailed(trigger, ())
            .map(|(permitted, _)| permitted)
    }

    /// [`Handle::can_fire`] with guard arguments.
    pub fn can_fire_with(
        &self,
        trigger: &T,
        args: impl IntoTriggerArgs,
    ) -> Result<bool, FireError<S, T>> {
        self.can_fire_detailed(trigger, args)
            .map(|(permitted, _)| permitted)
    }

    /// Whether firing `trigger` would be handled, along with the unmet
    /// guard descriptions when it would not be.
    pub fn can_fire_detailed(
        &self,
        trigger: &T,
        args: impl IntoTriggerArgs,
    ) -> Result<(bool, Vec<String>), FireError<S, T>> {
        let args = args.into_trigger_args();
        match self
            .machine
            .graph()
            .resolve_handler(&self.context.state(), trigger, &args)
        {
            HandlerResolution::Handler(_) => Ok((true, Vec::new())),
            HandlerResolution::None { unmet } => Ok((false, unmet)),
            HandlerResolution::Ambiguous => Err(FireError::MultiplePermitted {
                state: self.context.state(),
                trigger: trigger.clone(),
            }),
        }
    }

    /// Triggers with at least one passing guard in the current state or an
    /// ancestor.
    pub fn permitted_triggers(&self) -> Vec<T> {
        self.permitted_triggers_with(())
    }

    /// [`Handle::permitted_triggers`] with guard arguments.
    pub fn permitted_triggers_with(&self, args: impl IntoTriggerArgs) -> Vec<T> {
        self.machine
            .graph()
            .permitted_triggers(&self.context.state(), &args.into_trigger_args())
    }

    /// Permitted triggers with their registered parameter descriptors.
    pub fn detailed_permitted_triggers(&self) -> Vec<TriggerDetails<T>> {
        self.permitted_triggers()
            .into_iter()
            .map(|trigger| {
                let parameters = self
                    .machine
                    .trigger_parameters(&trigger)
                    .map(|p| p.specs().to_vec())
                    .unwrap_or_default();
                TriggerDetails {
                    trigger,
                    parameters,
                }
            })
            .collect()
    }

    /// Run activation actions along the current state's chain, outside-in.
    /// Redundant calls are no-ops.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        let machine = self.machine;
        let chain = machine.graph().chain(&self.context.state());
        for state in chain.iter().rev() {
            if let Some(rep) = machine.graph().representation(state) {
                for action in rep.activate_actions() {
                    self.invoke_lifecycle(action);
                }
            }
        }
        self.active = true;
    }

    /// Run deactivation actions along the current state's chain,
    /// inside-out. Redundant calls are no-ops.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        let machine = self.machine;
        let chain = machine.graph().chain(&self.context.state());
        for state in &chain {
            if let Some(rep) = machine.graph().representation(state) {
                for action in rep.deactivate_actions() {
                    self.invoke_lifecycle(action);
                }
            }
        }
        self.active = false;
    }

    /// Whether [`Handle::activate`] has been called without a matching
    /// [`Handle::deactivate`].
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A reflection snapshot rooted at this handle's initial state.
    pub fn get_info(&self) -> StateMachineInfo<S, T> {
        self.machine.get_info(self.initial_state.clone())
    }

    fn internal_fire(&mut self, trigger: T, args: TriggerArgs) -> Result<(), FireError<S, T>> {
        match self.machine.firing_mode() {
            FiringMode::Immediate => self.fire_one(trigger, args),
            FiringMode::Queued => {
                self.queue.push_back((trigger, args));
                if self.firing {
                    // The in-progress fire's drain loop will pick it up.
                    return Ok(());
                }
                self.firing = true;
                let outcome = self.drain_queue();
                self.firing = false;
                outcome
            }
        }
    }

    fn drain_queue(&mut self) -> Result<(), FireError<S, T>> {
        while let Some((trigger, args)) = self.queue.pop_front() {
            self.fire_one(trigger, args)?;
        }
        Ok(())
    }

    fn fire_one(&mut self, trigger: T, args: TriggerArgs) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        machine.validate_trigger_args(&trigger, &args)?;

        let source = self.context.state();
        match machine.graph().resolve_handler(&source, &trigger, &args) {
            HandlerResolution::Ambiguous => Err(FireError::MultiplePermitted {
                state: source,
                trigger,
            }),
            HandlerResolution::None { unmet } => machine.unhandled(&source, &trigger, &unmet),
            HandlerResolution::Handler(behaviour) => match &behaviour.kind {
                TriggerBehaviourKind::Ignored => Ok(()),
                TriggerBehaviourKind::Transitioning { destination } => {
                    self.transition_to(source, destination.clone(), trigger, args)
                }
                TriggerBehaviourKind::Dynamic { selector, .. } => {
                    let destination = selector(&args);
                    self.transition_to(source, destination, trigger, args)
                }
                TriggerBehaviourKind::Reentry { destination } => {
                    self.reenter(source, destination.clone(), trigger, args)
                }
                TriggerBehaviourKind::Internal { .. } => self.run_internal(source, trigger, args),
            },
        }
    }

    /// A fixed or dynamic transition: exit up to the common ancestor, write
    /// the state, notify, enter the destination's chain, then fix the state
    /// up to wherever initial descents (or, in immediate mode, nested
    /// fires) left the machine.
    fn transition_to(
        &mut self,
        source: S,
        destination: S,
        trigger: T,
        args: TriggerArgs,
    ) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        let transition = Transition::new(source, destination.clone(), trigger, args);
        let transition = self.run_exit_chain(transition)?;

        self.context.set_state(destination.clone());
        machine.notify_transitioned(&transition);

        let final_state = self.enter(destination, &transition)?;
        if self.context.state() != final_state {
            self.context.set_state(final_state.clone());
        }

        let completed = transition.with_destination(final_state);
        machine.notify_completed(&completed);
        self.history = self.history.record(TransitionRecord::from(&completed));
        Ok(())
    }

    /// Reentry: exit, and when the exit walk ended above the destination
    /// (reentry declared on a superstate, fired from a substate) the
    /// destination's own exit actions still run before it is re-entered.
    fn reenter(
        &mut self,
        source: S,
        destination: S,
        trigger: T,
        args: TriggerArgs,
    ) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        let transition = Transition::new(source, destination.clone(), trigger, args);
        let mut transition = self.run_exit_chain(transition)?;

        if transition.source() != &destination {
            transition = Transition::new(
                destination.clone(),
                destination.clone(),
                transition.trigger().clone(),
                transition.args().clone(),
            );
            transition = self.run_exit_chain(transition)?;
        }

        self.context.set_state(destination.clone());
        machine.notify_transitioned(&transition);

        let final_state = self.enter(destination, &transition)?;
        if self.context.state() != final_state {
            self.context.set_state(final_state.clone());
        }

        let completed = transition.with_destination(final_state);
        machine.notify_completed(&completed);
        self.history = self.history.record(TransitionRecord::from(&completed));
        Ok(())
    }

    /// Internal transition: no exit, no entry, no observers, no state
    /// change. The state is re-read because an earlier queued action may
    /// have moved the machine, and the action is resolved from wherever it
    /// is now.
    fn run_internal(&mut self, source: S, trigger: T, args: TriggerArgs) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        let current = self.context.state();
        let transition = Transition::new(source.clone(), source, trigger, args);

        if let HandlerResolution::Handler(behaviour) =
            machine
                .graph()
                .resolve_handler(&current, transition.trigger(), transition.args())
        {
            if let TriggerBehaviourKind::Internal { action, .. } = &behaviour.kind {
                return self.invoke_action(action, &transition);
            }
        }
        Ok(())
    }

    /// Run the exit actions for a transition, innermost first, and rewrite
    /// the transition's source to the last state exited.
    fn run_exit_chain(
        &mut self,
        transition: Transition<S, T>,
    ) -> Result<Transition<S, T>, FireError<S, T>> {
        let machine = self.machine;
        let chain = machine.graph().exit_chain(
            transition.source(),
            transition.destination(),
            transition.is_reentry(),
        );
        for state in &chain {
            self.run_exit_actions(state, &transition)?;
        }
        match chain.last() {
            Some(last) if last != transition.source() => Ok(transition.with_source(last.clone())),
            _ => Ok(transition),
        }
    }

    fn run_exit_actions(
        &mut self,
        state: &S,
        transition: &Transition<S, T>,
    ) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        let Some(rep) = machine.graph().representation(state) else {
            return Ok(());
        };
        for action in rep.exit_actions() {
            self.invoke_action(&action.callback, transition)?;
        }
        Ok(())
    }

    /// Enter `destination` and return the state the machine finally settled
    /// in, after initial-transition descents and (in immediate mode) any
    /// state changes caused by nested fires during entry.
    fn enter(
        &mut self,
        destination: S,
        transition: &Transition<S, T>,
    ) -> Result<S, FireError<S, T>> {
        let machine = self.machine;
        self.run_entry_chain(&destination, transition)?;

        let mut current = destination;
        if machine.firing_mode() == FiringMode::Immediate {
            // A trigger fired inside an entry action may have moved the
            // machine; rebind to wherever the context says we are.
            let observed = self.context.state();
            if observed != current {
                current = observed;
            }
        }

        if let Some(target) = machine.graph().initial_target_of(&current).cloned() {
            if !machine.graph().is_direct_substate(&target, &current) {
                return Err(FireError::BadInitialTransition {
                    state: current,
                    target,
                });
            }
            let descent = Transition::new(
                current.clone(),
                target.clone(),
                transition.trigger().clone(),
                transition.args().clone(),
            );
            machine.notify_transitioned(&descent);

            let initial = Transition::initial(
                transition.source().clone(),
                target.clone(),
                transition.trigger().clone(),
                transition.args().clone(),
            );
            return self.enter(target, &initial);
        }
        Ok(current)
    }

    fn run_entry_chain(
        &mut self,
        destination: &S,
        transition: &Transition<S, T>,
    ) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        let chain = machine.graph().entry_chain(
            destination,
            transition.source(),
            transition.is_initial(),
            transition.is_reentry(),
        );
        for state in &chain {
            self.run_entry_actions(state, transition)?;
        }
        Ok(())
    }

    fn run_entry_actions(
        &mut self,
        state: &S,
        transition: &Transition<S, T>,
    ) -> Result<(), FireError<S, T>> {
        let machine = self.machine;
        let Some(rep) = machine.graph().representation(state) else {
            return Ok(());
        };
        for action in rep.entry_actions() {
            if action.applies_to(transition.trigger()) {
                self.invoke_action(&action.callback, transition)?;
            }
        }
        Ok(())
    }

    /// Invoke one action, then dispatch whatever it asked to fire: queued
    /// mode defers to the run-to-completion queue, immediate mode processes
    /// synchronously before anything else happens.
    fn invoke_action(
        &mut self,
        callback: &ActionFn<S, T, C>,
        transition: &Transition<S, T>,
    ) -> Result<(), FireError<S, T>> {
        let mut requests = TriggerQueue::new(self.machine.retains_synchronization_context());
        callback(&mut self.context, transition, &mut requests);
        self.dispatch_requests(requests)
    }

    fn dispatch_requests(&mut self, requests: TriggerQueue<T>) -> Result<(), FireError<S, T>> {
        for (trigger, args) in requests.into_requests() {
            // Queued mode sees the firing flag set and defers to the drain
            // loop; immediate mode recurses into fire_one right here.
            self.internal_fire(trigger, args)?;
        }
        Ok(())
    }

    fn invoke_lifecycle(&mut self, action: &LifecycleAction<C>) {
        (action.callback)(&mut self.context);
    }
}
