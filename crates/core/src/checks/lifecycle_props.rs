//! Property-based tests for the check lifecycle.

use chrono::NaiveDate;
use proptest::prelude::*;

use super::lifecycle::CheckLifecycle;
use super::types::CheckState;

fn state_strategy() -> impl Strategy<Value = CheckState> {
    prop_oneof![
        Just(CheckState::Pending),
        Just(CheckState::Cleared),
        Just(CheckState::Bounced),
        Just(CheckState::Voided),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Clear,
    Bounce,
    Void,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Clear), Just(Action::Bounce), Just(Action::Void)]
}

fn apply(state: CheckState, action: Action) -> Option<CheckState> {
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let result = match action {
        Action::Clear => CheckLifecycle::clear(state, date),
        Action::Bounce => CheckLifecycle::bounce(state, None),
        Action::Void => CheckLifecycle::void(state, "admin".to_string()),
    };
    result.ok().map(|t| t.new_state())
}

proptest! {
    /// A check leaves pending at most once, whatever sequence of actions is tried.
    #[test]
    fn prop_leaves_pending_at_most_once(actions in prop::collection::vec(action_strategy(), 1..10)) {
        let mut state = CheckState::Pending;
        let mut successes = 0;
        for action in actions {
            if let Some(next) = apply(state, action) {
                successes += 1;
                state = next;
            }
        }
        prop_assert_eq!(successes, 1);
        prop_assert!(state.is_terminal());
    }

    /// Terminal states reject every action.
    #[test]
    fn prop_terminal_states_are_frozen(state in state_strategy(), action in action_strategy()) {
        let outcome = apply(state, action);
        prop_assert_eq!(outcome.is_some(), !state.is_terminal());
    }

    /// The predicate agrees with the transition functions.
    #[test]
    fn prop_predicate_matches_functions(state in state_strategy(), action in action_strategy()) {
        if let Some(next) = apply(state, action) {
            prop_assert!(CheckLifecycle::is_valid_transition(state, next));
        }
        prop_assert!(!CheckLifecycle::is_valid_transition(state, CheckState::Pending));
    }
}
