//! Property-based tests for the dispatch engine.
//!
//! These tests use proptest to verify invariants across randomly generated
//! trigger sequences.

use proptest::prelude::*;
use strata::{FireError, Guard, StateCell, StateMachine, TriggerArgs};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum State {
    Idle,
    Loading,
    Running,
    Paused,
    Stopped,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Trigger {
    Load,
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
}

type Machine = StateMachine<State, Trigger, StateCell<State>>;

/// A flat machine: every state, every transition unguarded.
fn flat_machine() -> Machine {
    let mut machine = Machine::new();
    machine
        .configure(State::Idle)
        .permit(Trigger::Load, State::Loading);
    machine
        .configure(State::Loading)
        .permit(Trigger::Start, State::Running)
        .permit(Trigger::Reset, State::Idle);
    machine
        .configure(State::Running)
        .permit(Trigger::Pause, State::Paused)
        .permit(Trigger::Stop, State::Stopped);
    machine
        .configure(State::Paused)
        .permit(Trigger::Resume, State::Running)
        .permit(Trigger::Stop, State::Stopped);
    machine
        .configure(State::Stopped)
        .permit(Trigger::Reset, State::Idle);
    machine
}

/// A hierarchical machine: Paused and Running live inside a composite
/// Loading... Running session; Stop is handled by the superstate.
fn nested_machine() -> Machine {
    let mut machine = Machine::new();
    machine
        .configure(State::Idle)
        .permit(Trigger::Start, State::Running);
    machine
        .configure(State::Loading)
        .permit(Trigger::Stop, State::Stopped)
        .ignore(Trigger::Start);
    machine
        .configure(State::Running)
        .substate_of(State::Loading)
        .unwrap()
        .permit(Trigger::Pause, State::Paused);
    machine
        .configure(State::Paused)
        .substate_of(State::Loading)
        .unwrap()
        .permit(Trigger::Resume, State::Running);
    machine
        .configure(State::Stopped)
        .permit(Trigger::Reset, State::Idle);
    machine
}

fn arbitrary_trigger() -> impl Strategy<Value = Trigger> {
    prop_oneof![
        Just(Trigger::Load),
        Just(Trigger::Start),
        Just(Trigger::Pause),
        Just(Trigger::Resume),
        Just(Trigger::Stop),
        Just(Trigger::Reset),
    ]
}

proptest! {
    /// can_fire is an exact oracle for fire on an unambiguous machine.
    #[test]
    fn can_fire_predicts_fire(triggers in prop::collection::vec(arbitrary_trigger(), 1..40)) {
        let machine = flat_machine();
        let mut handle = machine.create_handle(StateCell::new(State::Idle), State::Idle);

        for trigger in triggers {
            let predicted = handle.can_fire(&trigger).unwrap();
            let outcome = handle.fire(trigger);
            prop_assert_eq!(predicted, outcome.is_ok());
        }
    }

    /// A failed fire leaves the state untouched; a successful one moves to
    /// a permitted destination.
    #[test]
    fn failed_fires_do_not_move_the_machine(triggers in prop::collection::vec(arbitrary_trigger(), 1..40)) {
        let machine = flat_machine();
        let mut handle = machine.create_handle(StateCell::new(State::Idle), State::Idle);

        for trigger in triggers {
            let before = handle.state();
            match handle.fire(trigger) {
                Ok(()) => {}
                Err(FireError::NoTransitionsPermitted { state, .. }) => {
                    prop_assert_eq!(&state, &before);
                    prop_assert_eq!(handle.state(), before);
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
    }

    /// On a flat machine the history chains: each record starts where the
    /// previous one ended.
    #[test]
    fn history_chains_across_fires(triggers in prop::collection::vec(arbitrary_trigger(), 1..40)) {
        let machine = flat_machine();
        let mut handle = machine.create_handle(StateCell::new(State::Idle), State::Idle);

        for trigger in triggers {
            let _ = handle.fire(trigger);
        }

        let records = handle.history().records();
        for pair in records.windows(2) {
            prop_assert_eq!(&pair[0].destination, &pair[1].source);
        }
        if let Some(last) = handle.history().last() {
            prop_assert_eq!(&last.destination, &handle.state());
        }
    }

    /// Every permitted trigger really fires, also through inherited
    /// handlers.
    #[test]
    fn permitted_triggers_are_sound(triggers in prop::collection::vec(arbitrary_trigger(), 1..40)) {
        let machine = nested_machine();
        let mut handle = machine.create_handle(StateCell::new(State::Idle), State::Idle);

        for trigger in triggers {
            for permitted in handle.permitted_triggers() {
                prop_assert!(handle.can_fire(&permitted).unwrap());
            }
            let _ = handle.fire(trigger);
        }
    }

    /// Timestamps in the history never run backwards.
    #[test]
    fn history_timestamps_are_monotone(triggers in prop::collection::vec(arbitrary_trigger(), 1..40)) {
        let machine = flat_machine();
        let mut handle = machine.create_handle(StateCell::new(State::Idle), State::Idle);

        for trigger in triggers {
            let _ = handle.fire(trigger);
        }

        let records = handle.history().records();
        for pair in records.windows(2) {
            prop_assert!(pair[0].fired_at <= pair[1].fired_at);
        }
    }

    /// Guards are pure: evaluating twice gives the same verdict.
    #[test]
    fn guards_are_deterministic(threshold in 0usize..8, len in 0usize..8) {
        let guard = Guard::when(move |args: &TriggerArgs| args.len() >= threshold, "long enough");
        let args = match len {
            0 => TriggerArgs::empty(),
            1 => strata::IntoTriggerArgs::into_trigger_args((0u8,)),
            2 => strata::IntoTriggerArgs::into_trigger_args((0u8, 1u8)),
            _ => strata::IntoTriggerArgs::into_trigger_args((0u8, 1u8, 2u8)),
        };
        prop_assert_eq!(guard.passes(&args), guard.passes(&args));
        prop_assert_eq!(guard.passes(&args), args.len() >= threshold);
    }
}

#[test]
fn activation_is_idempotent_across_repeated_calls() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let count = Arc::new(AtomicU32::new(0));
    let mut machine = Machine::new();
    {
        let count = count.clone();
        machine.configure(State::Idle).on_activate(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
    }

    let mut handle = machine.create_handle(StateCell::new(State::Idle), State::Idle);
    handle.activate();
    handle.activate();
    handle.activate();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    handle.deactivate();
    handle.activate();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}
