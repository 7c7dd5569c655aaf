//! Per-state configuration records and the pure resolution logic over them.
//!
//! A [`StateRepresentation`] stores everything configured for one state.
//! Superstates and substates are stored by key and resolved through the
//! [`StateGraph`] on every traversal, so representations never reference
//! each other. The graph answers every structural question — handler
//! resolution, subtree membership, exit/entry chains, permitted triggers —
//! as pure functions; executing actions against a context is the handle's
//! job.

use std::collections::HashMap;

use crate::core::args::TriggerArgs;
use crate::core::behaviour::{
    EntryAction, ExitAction, LifecycleAction, TriggerBehaviour,
};
use crate::core::state::{StateValue, TriggerValue};

/// The configured record for one state.
pub(crate) struct StateRepresentation<S, T, C> {
    state: S,
    superstate: Option<S>,
    substates: Vec<S>,
    // Insertion-ordered: guard evaluation and reflection follow declaration
    // order, so this is an association list rather than a map.
    behaviours: Vec<(T, Vec<TriggerBehaviour<S, T, C>>)>,
    entry_actions: Vec<EntryAction<S, T, C>>,
    exit_actions: Vec<ExitAction<S, T, C>>,
    activate_actions: Vec<LifecycleAction<C>>,
    deactivate_actions: Vec<LifecycleAction<C>>,
    initial_target: Option<S>,
}

impl<S: StateValue, T: TriggerValue, C> StateRepresentation<S, T, C> {
    fn new(state: S) -> Self {
        Self {
            state,
            superstate: None,
            substates: Vec::new(),
            behaviours: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            activate_actions: Vec::new(),
            deactivate_actions: Vec::new(),
            initial_target: None,
        }
    }

    pub(crate) fn state(&self) -> &S {
        &self.state
    }

    pub(crate) fn superstate(&self) -> Option<&S> {
        self.superstate.as_ref()
    }

    pub(crate) fn substates(&self) -> &[S] {
        &self.substates
    }

    pub(crate) fn behaviours(&self) -> &[(T, Vec<TriggerBehaviour<S, T, C>>)] {
        &self.behaviours
    }

    pub(crate) fn entry_actions(&self) -> &[EntryAction<S, T, C>] {
        &self.entry_actions
    }

    pub(crate) fn exit_actions(&self) -> &[ExitAction<S, T, C>] {
        &self.exit_actions
    }

    pub(crate) fn activate_actions(&self) -> &[LifecycleAction<C>] {
        &self.activate_actions
    }

    pub(crate) fn deactivate_actions(&self) -> &[LifecycleAction<C>] {
        &self.deactivate_actions
    }

    pub(crate) fn initial_target(&self) -> Option<&S> {
        self.initial_target.as_ref()
    }

    pub(crate) fn set_superstate(&mut self, parent: S) {
        self.superstate = Some(parent);
    }

    pub(crate) fn clear_superstate(&mut self) -> Option<S> {
        self.superstate.take()
    }

    pub(crate) fn add_substate(&mut self, child: S) {
        if !self.substates.contains(&child) {
            self.substates.push(child);
        }
    }

    pub(crate) fn remove_substate(&mut self, child: &S) {
        self.substates.retain(|s| s != child);
    }

    pub(crate) fn set_initial_target(&mut self, target: S) {
        self.initial_target = Some(target);
    }

    pub(crate) fn add_behaviour(&mut self, trigger: T, behaviour: TriggerBehaviour<S, T, C>) {
        match self.behaviours.iter_mut().find(|(t, _)| *t == trigger) {
            Some((_, list)) => list.push(behaviour),
            None => self.behaviours.push((trigger, vec![behaviour])),
        }
    }

    pub(crate) fn add_entry_action(&mut self, action: EntryAction<S, T, C>) {
        self.entry_actions.push(action);
    }

    pub(crate) fn add_exit_action(&mut self, action: ExitAction<S, T, C>) {
        self.exit_actions.push(action);
    }

    pub(crate) fn add_activate_action(&mut self, action: LifecycleAction<C>) {
        self.activate_actions.push(action);
    }

    pub(crate) fn add_deactivate_action(&mut self, action: LifecycleAction<C>) {
        self.deactivate_actions.push(action);
    }

    /// Search this state's own behaviour list for `trigger`.
    fn local_handler(&self, trigger: &T, args: &TriggerArgs) -> LocalHandler<'_, S, T, C> {
        let Some((_, list)) = self.behaviours.iter().find(|(t, _)| t == trigger) else {
            return LocalHandler::NotDeclared;
        };

        let passing: Vec<&TriggerBehaviour<S, T, C>> =
            list.iter().filter(|b| b.guard.passes(args)).collect();
        match passing.len() {
            1 => LocalHandler::Found(passing[0]),
            0 => LocalHandler::Unmet(
                list.iter().flat_map(|b| b.guard.unmet(args)).collect(),
            ),
            _ => LocalHandler::Ambiguous,
        }
    }
}

enum LocalHandler<'a, S, T, C> {
    Found(&'a TriggerBehaviour<S, T, C>),
    Ambiguous,
    Unmet(Vec<String>),
    NotDeclared,
}

/// Outcome of resolving a trigger against a state and its ancestors.
pub(crate) enum HandlerResolution<'a, S, T, C> {
    /// Exactly one behaviour's guard passed somewhere along the chain.
    Handler(&'a TriggerBehaviour<S, T, C>),
    /// No behaviour matched; `unmet` aggregates the failing guard
    /// descriptions encountered along the chain.
    None { unmet: Vec<String> },
    /// More than one guard passed for the trigger within a single state.
    Ambiguous,
}

/// The engine's state map plus configuration declaration order.
pub(crate) struct StateGraph<S, T, C> {
    states: HashMap<S, StateRepresentation<S, T, C>>,
    declared: Vec<S>,
}

impl<S: StateValue, T: TriggerValue, C> StateGraph<S, T, C> {
    pub(crate) fn new() -> Self {
        Self {
            states: HashMap::new(),
            declared: Vec::new(),
        }
    }

    /// States in first-mention order.
    pub(crate) fn declared(&self) -> &[S] {
        &self.declared
    }

    pub(crate) fn representation(&self, state: &S) -> Option<&StateRepresentation<S, T, C>> {
        self.states.get(state)
    }

    /// The representation for `state`, created on first mention.
    pub(crate) fn ensure(&mut self, state: &S) -> &mut StateRepresentation<S, T, C> {
        if !self.states.contains_key(state) {
            self.declared.push(state.clone());
        }
        self.states
            .entry(state.clone())
            .or_insert_with(|| StateRepresentation::new(state.clone()))
    }

    pub(crate) fn superstate_of(&self, state: &S) -> Option<&S> {
        self.representation(state)?.superstate()
    }

    pub(crate) fn initial_target_of(&self, state: &S) -> Option<&S> {
        self.representation(state)?.initial_target()
    }

    pub(crate) fn is_direct_substate(&self, child: &S, parent: &S) -> bool {
        self.representation(parent)
            .is_some_and(|rep| rep.substates().contains(child))
    }

    /// The ancestor chain of `state`, innermost first, starting with
    /// `state` itself. States never configured are leaves.
    pub(crate) fn chain(&self, state: &S) -> Vec<S> {
        let mut chain = vec![state.clone()];
        let mut current = state.clone();
        while let Some(parent) = self.superstate_of(&current) {
            chain.push(parent.clone());
            current = parent.clone();
        }
        chain
    }

    /// True iff `state` equals `ancestor` or has it in its superstate
    /// chain.
    pub(crate) fn is_within(&self, state: &S, ancestor: &S) -> bool {
        if state == ancestor {
            return true;
        }
        let mut current = state.clone();
        while let Some(parent) = self.superstate_of(&current) {
            if parent == ancestor {
                return true;
            }
            current = parent.clone();
        }
        false
    }

    /// Resolve `trigger` for a machine currently in `state`, walking the
    /// superstate chain per the handler-search order.
    pub(crate) fn resolve_handler(
        &self,
        state: &S,
        trigger: &T,
        args: &TriggerArgs,
    ) -> HandlerResolution<'_, S, T, C> {
        let mut unmet = Vec::new();
        let mut current = Some(state.clone());
        while let Some(s) = current {
            let Some(rep) = self.representation(&s) else {
                break;
            };
            match rep.local_handler(trigger, args) {
                LocalHandler::Found(behaviour) => {
                    return HandlerResolution::Handler(behaviour);
                }
                LocalHandler::Ambiguous => return HandlerResolution::Ambiguous,
                LocalHandler::Unmet(mut descriptions) => unmet.append(&mut descriptions),
                LocalHandler::NotDeclared => {}
            }
            current = rep.superstate().cloned();
        }
        HandlerResolution::None { unmet }
    }

    /// The states whose exit actions run for a transition, innermost first.
    ///
    /// Reentry exits exactly the source. Otherwise the walk ascends from
    /// the source until it reaches a state whose subtree contains the
    /// destination; that common ancestor is not exited.
    pub(crate) fn exit_chain(&self, source: &S, destination: &S, reentry: bool) -> Vec<S> {
        if reentry {
            return vec![source.clone()];
        }
        let mut chain = Vec::new();
        let mut current = source.clone();
        loop {
            if self.is_within(destination, &current) {
                break;
            }
            chain.push(current.clone());
            match self.superstate_of(&current) {
                Some(parent) => current = parent.clone(),
                None => break,
            }
        }
        chain
    }

    /// The states whose entry actions run for a transition, outermost
    /// first.
    ///
    /// Reentry and initial-descent transitions enter exactly the
    /// destination. Entering an ancestor of the source runs nothing. The
    /// climb stops below the first superstate that already contains the
    /// source.
    pub(crate) fn entry_chain(
        &self,
        destination: &S,
        source: &S,
        initial: bool,
        reentry: bool,
    ) -> Vec<S> {
        if reentry || initial {
            return vec![destination.clone()];
        }
        if self.is_within(source, destination) {
            return Vec::new();
        }
        let mut chain = vec![destination.clone()];
        let mut current = destination.clone();
        while let Some(parent) = self.superstate_of(&current) {
            if self.is_within(source, parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent.clone();
        }
        chain.reverse();
        chain
    }

    /// Triggers with at least one passing guard in `state` or an ancestor,
    /// in declaration order, innermost state first, deduplicated.
    pub(crate) fn permitted_triggers(&self, state: &S, args: &TriggerArgs) -> Vec<T> {
        let mut permitted = Vec::new();
        let mut current = Some(state.clone());
        while let Some(s) = current {
            let Some(rep) = self.representation(&s) else {
                break;
            };
            for (trigger, list) in rep.behaviours() {
                if permitted.contains(trigger) {
                    continue;
                }
                if list.iter().any(|b| b.guard.passes(args)) {
                    permitted.push(trigger.clone());
                }
            }
            current = rep.superstate().cloned();
        }
        permitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behaviour::TriggerBehaviourKind;
    use crate::core::guard::Guard;
    use crate::core::state::StateCell;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum State {
        Root,
        Left,
        LeftChild,
        Right,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum Trigger {
        Go,
        Stop,
    }

    type Graph = StateGraph<State, Trigger, StateCell<State>>;

    fn hierarchy() -> Graph {
        // Root ── Left ── LeftChild
        //     └── Right
        let mut graph = Graph::new();
        graph.ensure(&State::Root);
        graph.ensure(&State::Left).set_superstate(State::Root);
        graph.ensure(&State::Root).add_substate(State::Left);
        graph.ensure(&State::LeftChild).set_superstate(State::Left);
        graph.ensure(&State::Left).add_substate(State::LeftChild);
        graph.ensure(&State::Right).set_superstate(State::Root);
        graph.ensure(&State::Root).add_substate(State::Right);
        graph
    }

    fn transitioning(destination: State, guard: Guard) -> TriggerBehaviour<State, Trigger, StateCell<State>> {
        TriggerBehaviour::new(TriggerBehaviourKind::Transitioning { destination }, guard)
    }

    #[test]
    fn chain_walks_to_the_root() {
        let graph = hierarchy();
        assert_eq!(
            graph.chain(&State::LeftChild),
            vec![State::LeftChild, State::Left, State::Root]
        );
        assert_eq!(graph.chain(&State::Root), vec![State::Root]);
    }

    #[test]
    fn is_within_covers_self_and_ancestors() {
        let graph = hierarchy();
        assert!(graph.is_within(&State::LeftChild, &State::LeftChild));
        assert!(graph.is_within(&State::LeftChild, &State::Left));
        assert!(graph.is_within(&State::LeftChild, &State::Root));
        assert!(!graph.is_within(&State::LeftChild, &State::Right));
        assert!(!graph.is_within(&State::Root, &State::Left));
    }

    #[test]
    fn exit_chain_stops_at_the_common_ancestor() {
        let graph = hierarchy();
        // LeftChild -> Right: exit LeftChild, Left; Root contains Right.
        assert_eq!(
            graph.exit_chain(&State::LeftChild, &State::Right, false),
            vec![State::LeftChild, State::Left]
        );
        // Transition into the own subtree exits nothing.
        assert!(graph
            .exit_chain(&State::Left, &State::LeftChild, false)
            .is_empty());
        // Reentry exits exactly the source.
        assert_eq!(
            graph.exit_chain(&State::LeftChild, &State::LeftChild, true),
            vec![State::LeftChild]
        );
    }

    #[test]
    fn entry_chain_runs_outermost_first() {
        let graph = hierarchy();
        // Right -> LeftChild: enter Left, then LeftChild; Root stays.
        assert_eq!(
            graph.entry_chain(&State::LeftChild, &State::Right, false, false),
            vec![State::Left, State::LeftChild]
        );
        // Entering an ancestor of the source runs nothing.
        assert!(graph
            .entry_chain(&State::Root, &State::LeftChild, false, false)
            .is_empty());
        // Initial descents enter only the target.
        assert_eq!(
            graph.entry_chain(&State::LeftChild, &State::Right, true, false),
            vec![State::LeftChild]
        );
    }

    #[test]
    fn handler_resolution_delegates_to_superstates() {
        let mut graph = hierarchy();
        graph
            .ensure(&State::Root)
            .add_behaviour(Trigger::Stop, transitioning(State::Right, Guard::always()));

        match graph.resolve_handler(&State::LeftChild, &Trigger::Stop, &TriggerArgs::empty()) {
            HandlerResolution::Handler(behaviour) => match &behaviour.kind {
                TriggerBehaviourKind::Transitioning { destination } => {
                    assert_eq!(destination, &State::Right);
                }
                _ => panic!("expected a transitioning behaviour"),
            },
            _ => panic!("expected the root's handler"),
        }
    }

    #[test]
    fn failing_guards_accumulate_up_the_chain() {
        let mut graph = hierarchy();
        graph.ensure(&State::Left).add_behaviour(
            Trigger::Go,
            transitioning(State::Right, Guard::when(|_| false, "left says no")),
        );
        graph.ensure(&State::Root).add_behaviour(
            Trigger::Go,
            transitioning(State::Right, Guard::when(|_| false, "root says no")),
        );

        match graph.resolve_handler(&State::LeftChild, &Trigger::Go, &TriggerArgs::empty()) {
            HandlerResolution::None { unmet } => {
                assert_eq!(unmet, vec!["left says no".to_string(), "root says no".to_string()]);
            }
            _ => panic!("expected no handler"),
        }
    }

    #[test]
    fn two_passing_guards_in_one_state_are_ambiguous() {
        let mut graph = hierarchy();
        let rep = graph.ensure(&State::Left);
        rep.add_behaviour(Trigger::Go, transitioning(State::Right, Guard::always()));
        rep.add_behaviour(Trigger::Go, transitioning(State::Root, Guard::always()));

        assert!(matches!(
            graph.resolve_handler(&State::Left, &Trigger::Go, &TriggerArgs::empty()),
            HandlerResolution::Ambiguous
        ));
    }

    #[test]
    fn a_substate_guard_failure_still_finds_the_ancestor_handler() {
        let mut graph = hierarchy();
        graph.ensure(&State::Left).add_behaviour(
            Trigger::Go,
            transitioning(State::Right, Guard::when(|_| false, "not here")),
        );
        graph
            .ensure(&State::Root)
            .add_behaviour(Trigger::Go, transitioning(State::Right, Guard::always()));

        assert!(matches!(
            graph.resolve_handler(&State::LeftChild, &Trigger::Go, &TriggerArgs::empty()),
            HandlerResolution::Handler(_)
        ));
    }

    #[test]
    fn permitted_triggers_union_ancestors_and_respect_guards() {
        let mut graph = hierarchy();
        graph
            .ensure(&State::Left)
            .add_behaviour(Trigger::Go, transitioning(State::Right, Guard::always()));
        graph.ensure(&State::Root).add_behaviour(
            Trigger::Stop,
            transitioning(State::Right, Guard::when(|_| false, "blocked")),
        );

        let permitted = graph.permitted_triggers(&State::LeftChild, &TriggerArgs::empty());
        assert_eq!(permitted, vec![Trigger::Go]);
    }

    #[test]
    fn ignored_with_a_passing_guard_is_permitted() {
        let mut graph = hierarchy();
        graph.ensure(&State::Left).add_behaviour(
            Trigger::Stop,
            TriggerBehaviour::new(TriggerBehaviourKind::Ignored, Guard::always()),
        );
        let permitted = graph.permitted_triggers(&State::Left, &TriggerArgs::empty());
        assert_eq!(permitted, vec![Trigger::Stop]);

        let mut graph = hierarchy();
        graph.ensure(&State::Left).add_behaviour(
            Trigger::Stop,
            TriggerBehaviour::new(
                TriggerBehaviourKind::Ignored,
                Guard::when(|_| false, "never"),
            ),
        );
        assert!(graph
            .permitted_triggers(&State::Left, &TriggerArgs::empty())
            .is_empty());
    }

    #[test]
    fn unconfigured_states_are_leaves() {
        let graph = Graph::new();
        assert_eq!(graph.chain(&State::Left), vec![State::Left]);
        assert!(matches!(
            graph.resolve_handler(&State::Left, &Trigger::Go, &TriggerArgs::empty()),
            HandlerResolution::None { .. }
        ));
    }

    #[test]
    fn declaration_order_is_first_mention_order() {
        let graph = hierarchy();
        assert_eq!(
            graph.declared(),
            &[State::Root, State::Left, State::LeftChild, State::Right]
        );
    }
}
