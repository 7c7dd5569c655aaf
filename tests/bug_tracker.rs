//! A bug tracker driven through the engine: assignment as a reentrant
//! substate, deferral, and parameterised triggers.

use strata::{FireError, StateContext, StateMachine};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum BugState {
    Open,
    Assigned,
    Deferred,
    Closed,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum BugTrigger {
    Assign,
    Defer,
    Close,
}

struct Bug {
    state: BugState,
    assignee: Option<String>,
    messages: Vec<String>,
}

impl Bug {
    fn new() -> Self {
        Self {
            state: BugState::Open,
            assignee: None,
            messages: Vec::new(),
        }
    }
}

impl StateContext<BugState> for Bug {
    fn state(&self) -> BugState {
        self.state.clone()
    }

    fn set_state(&mut self, state: BugState) {
        self.state = state;
    }
}

type Machine = StateMachine<BugState, BugTrigger, Bug>;

fn bug_tracker() -> Machine {
    let mut machine = Machine::new();
    machine
        .set_trigger_parameters::<(String,)>(BugTrigger::Assign)
        .unwrap();

    machine
        .configure(BugState::Open)
        .permit(BugTrigger::Assign, BugState::Assigned)
        .permit(BugTrigger::Defer, BugState::Deferred)
        .permit(BugTrigger::Close, BugState::Closed)
        .on_exit(|bug: &mut Bug, _, _| {
            bug.messages.push("left open".to_string());
        });

    machine
        .configure(BugState::Assigned)
        .substate_of(BugState::Open)
        .unwrap()
        .permit_reentry(BugTrigger::Assign)
        .on_entry_from(BugTrigger::Assign, |bug: &mut Bug, transition, _| {
            let assignee = transition
                .args()
                .get::<String>(0)
                .expect("Assign carries the assignee name")
                .clone();
            if let Some(previous) = &bug.assignee {
                if previous != &assignee {
                    bug.messages
                        .push(format!("{previous}: please help the new employee"));
                }
            }
            bug.assignee = Some(assignee.clone());
            bug.messages.push(format!("{assignee}: you own it"));
        })
        .on_exit(|bug: &mut Bug, _, _| {
            if let Some(assignee) = &bug.assignee {
                bug.messages.push(format!("{assignee}: off the hook"));
            }
        });

    machine
        .configure(BugState::Deferred)
        .permit(BugTrigger::Assign, BugState::Assigned)
        .on_entry(|bug: &mut Bug, _, _| {
            bug.assignee = None;
        });

    machine
}

#[test]
fn assignment_enters_the_substate_and_records_the_assignee() {
    let machine = bug_tracker();
    let mut bug = machine.create_handle(Bug::new(), BugState::Open);

    bug.fire_with(BugTrigger::Assign, ("alice".to_string(),))
        .unwrap();

    assert_eq!(bug.state(), BugState::Assigned);
    assert!(bug.is_in_state(&BugState::Open));
    assert_eq!(bug.context().assignee.as_deref(), Some("alice"));
}

#[test]
fn reassignment_reenters_and_notifies_both_parties() {
    let machine = bug_tracker();
    let mut bug = machine.create_handle(Bug::new(), BugState::Open);

    bug.fire_with(BugTrigger::Assign, ("alice".to_string(),))
        .unwrap();
    bug.fire_with(BugTrigger::Assign, ("bob".to_string(),))
        .unwrap();

    assert_eq!(bug.state(), BugState::Assigned);
    assert_eq!(bug.context().assignee.as_deref(), Some("bob"));

    // Reentry: alice is released by the exit action first, then the entry
    // action observes her as the previous assignee before handing over.
    let messages = &bug.context().messages;
    let off_hook = messages
        .iter()
        .position(|m| m == "alice: off the hook")
        .expect("exit action ran");
    let help = messages
        .iter()
        .position(|m| m == "alice: please help the new employee")
        .expect("entry action observed the previous assignee");
    let own_it = messages
        .iter()
        .position(|m| m == "bob: you own it")
        .expect("entry action ran for bob");
    assert!(off_hook < help);
    assert!(help < own_it);
}

#[test]
fn deferring_exits_the_whole_open_subtree_and_clears_the_assignee() {
    let machine = bug_tracker();
    let mut bug = machine.create_handle(Bug::new(), BugState::Open);

    bug.fire_with(BugTrigger::Assign, ("alice".to_string(),))
        .unwrap();
    bug.fire(BugTrigger::Defer).unwrap();

    assert_eq!(bug.state(), BugState::Deferred);
    assert!(bug.context().assignee.is_none());

    // Exit actions ran innermost first: Assigned before Open.
    let messages = &bug.context().messages;
    let assigned_exit = messages
        .iter()
        .position(|m| m == "alice: off the hook")
        .unwrap();
    let open_exit = messages.iter().position(|m| m == "left open").unwrap();
    assert!(assigned_exit < open_exit);
}

#[test]
fn a_deferred_bug_can_be_assigned_again() {
    let machine = bug_tracker();
    let mut bug = machine.create_handle(Bug::new(), BugState::Open);

    bug.fire_with(BugTrigger::Assign, ("alice".to_string(),))
        .unwrap();
    bug.fire(BugTrigger::Defer).unwrap();
    bug.fire_with(BugTrigger::Assign, ("carol".to_string(),))
        .unwrap();

    assert_eq!(bug.state(), BugState::Assigned);
    assert_eq!(bug.context().assignee.as_deref(), Some("carol"));
}

#[test]
fn assign_requires_its_registered_argument() {
    let machine = bug_tracker();
    let mut bug = machine.create_handle(Bug::new(), BugState::Open);

    assert!(matches!(
        bug.fire(BugTrigger::Assign),
        Err(FireError::ArityMismatch {
            expected: 1,
            actual: 0,
            ..
        })
    ));

    assert!(matches!(
        bug.fire_with(BugTrigger::Assign, (42u32,)),
        Err(FireError::TypeMismatch { index: 0, .. })
    ));

    // Failed validation leaves the machine untouched.
    assert_eq!(bug.state(), BugState::Open);
    assert!(bug.context().messages.is_empty());
}

#[test]
fn closing_works_from_the_assigned_substate() {
    let machine = bug_tracker();
    let mut bug = machine.create_handle(Bug::new(), BugState::Open);

    bug.fire_with(BugTrigger::Assign, ("alice".to_string(),))
        .unwrap();
    bug.fire(BugTrigger::Close).unwrap();

    assert_eq!(bug.state(), BugState::Closed);
    assert_eq!(
        bug.history().path(),
        vec![&BugState::Open, &BugState::Assigned, &BugState::Closed]
    );
}
