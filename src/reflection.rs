//! Introspection snapshots for diagram generators.
//!
//! The snapshot is produced on demand by walking the configuration in
//! declaration order; there is no shadow structure kept in sync. It
//! serializes whenever the state and trigger types do.

use serde::Serialize;

use crate::core::behaviour::TriggerBehaviourKind;
use crate::core::state::{StateValue, TriggerValue};
use crate::machine::engine::StateMachine;

/// A snapshot of a configured state machine.
#[derive(Clone, Debug, Serialize)]
#[serde(bound(serialize = "S: Serialize, T: Serialize"))]
pub struct StateMachineInfo<S, T> {
    /// The initial state the snapshot is rooted at.
    pub initial_state: S,
    /// Every configured state plus every fixed-transition destination, in
    /// declaration order.
    pub states: Vec<StateInfo<S, T>>,
}

/// One state's structure and behaviour.
#[derive(Clone, Debug, Serialize)]
#[serde(bound(serialize = "S: Serialize, T: Serialize"))]
pub struct StateInfo<S, T> {
    /// The state value.
    pub state: S,
    /// The superstate, if the state is nested.
    pub superstate: Option<S>,
    /// Direct substates, in declaration order.
    pub substates: Vec<S>,
    /// The initial-transition target, if configured.
    pub initial_transition_target: Option<S>,
    /// Entry action descriptions, with their from-trigger filters.
    pub entry_actions: Vec<ActionInfo<T>>,
    /// Exit action descriptions.
    pub exit_actions: Vec<String>,
    /// Activation action descriptions.
    pub activate_actions: Vec<String>,
    /// Deactivation action descriptions.
    pub deactivate_actions: Vec<String>,
    /// Outgoing transitions, in declaration order.
    pub transitions: Vec<TransitionInfo<S, T>>,
}

/// An entry action's description and optional from-trigger filter.
#[derive(Clone, Debug, Serialize)]
#[serde(bound(serialize = "T: Serialize"))]
pub struct ActionInfo<T> {
    /// Descriptor string for the action.
    pub description: String,
    /// When set, the action only runs for transitions caused by this
    /// trigger.
    pub from_trigger: Option<T>,
}

/// One configured trigger behaviour.
///
/// Internal transitions appear as `Fixed` self-loops: the state does not
/// change, which diagram generators draw as a loop edge.
#[derive(Clone, Debug, Serialize)]
#[serde(bound(serialize = "S: Serialize, T: Serialize"))]
pub enum TransitionInfo<S, T> {
    /// A transition with a statically-known destination.
    Fixed {
        /// The trigger.
        trigger: T,
        /// The destination state.
        destination: S,
        /// Guard condition descriptions.
        guards: Vec<String>,
    },
    /// A transition whose destination is computed at fire time.
    Dynamic {
        /// The trigger.
        trigger: T,
        /// Descriptor of the destination selector.
        selector: String,
        /// Guard condition descriptions.
        guards: Vec<String>,
    },
    /// A trigger consumed silently.
    Ignored {
        /// The trigger.
        trigger: T,
        /// Guard condition descriptions.
        guards: Vec<String>,
    },
}

pub(crate) fn build_info<S: StateValue, T: TriggerValue, C>(
    machine: &StateMachine<S, T, C>,
    initial_state: S,
) -> StateMachineInfo<S, T> {
    let graph = machine.graph();
    let states = graph
        .declared()
        .iter()
        .map(|state| {
            let rep = graph
                .representation(state)
                .expect("declared states always have a representation");

            let transitions = rep
                .behaviours()
                .iter()
                .flat_map(|(trigger, list)| {
                    list.iter().map(move |behaviour| {
                        let guards = behaviour.guard.descriptions();
                        match &behaviour.kind {
                            TriggerBehaviourKind::Transitioning { destination } => {
                                TransitionInfo::Fixed {
                                    trigger: trigger.clone(),
                                    destination: destination.clone(),
                                    guards,
                                }
                            }
                            TriggerBehaviourKind::Reentry { destination } => {
                                TransitionInfo::Fixed {
                                    trigger: trigger.clone(),
                                    destination: destination.clone(),
                                    guards,
                                }
                            }
                            TriggerBehaviourKind::Internal { .. } => TransitionInfo::Fixed {
                                trigger: trigger.clone(),
                                destination: state.clone(),
                                guards,
                            },
                            TriggerBehaviourKind::Ignored => TransitionInfo::Ignored {
                                trigger: trigger.clone(),
                                guards,
                            },
                            TriggerBehaviourKind::Dynamic { description, .. } => {
                                TransitionInfo::Dynamic {
                                    trigger: trigger.clone(),
                                    selector: description.clone(),
                                    guards,
                                }
                            }
                        }
                    })
                })
                .collect();

            StateInfo {
                state: rep.state().clone(),
                superstate: rep.superstate().cloned(),
                substates: rep.substates().to_vec(),
                initial_transition_target: rep.initial_target().cloned(),
                entry_actions: rep
                    .entry_actions()
                    .iter()
                    .map(|a| ActionInfo {
                        description: a.description.clone(),
                        from_trigger: a.from_trigger.clone(),
                    })
                    .collect(),
                exit_actions: rep
                    .exit_actions()
                    .iter()
                    .map(|a| a.description.clone())
                    .collect(),
                activate_actions: rep
                    .activate_actions()
                    .iter()
                    .map(|a| a.description.clone())
                    .collect(),
                deactivate_actions: rep
                    .deactivate_actions()
                    .iter()
                    .map(|a| a.description.clone())
                    .collect(),
                transitions,
            }
        })
        .collect();

    StateMachineInfo {
        initial_state,
        states,
    }
}
