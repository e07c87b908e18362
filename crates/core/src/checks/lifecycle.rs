//! Check lifecycle state machine.
//!
//! Every transition leaves `Pending`; terminal states are immutable.

use chrono::NaiveDate;

use super::types::{CheckAdminUpdate, CheckState, CheckTransition};
use crate::ledger::LedgerError;

/// Stateless check lifecycle rules.
///
/// All methods are associated functions that validate a transition and return
/// the `CheckTransition` to persist.
pub struct CheckLifecycle;

impl CheckLifecycle {
    /// Mark a pending check as cleared on `cleared_on`.
    ///
    /// # Returns
    /// * `Ok(CheckTransition::Clear)` if the check is pending
    /// * `Err(LedgerError::InvalidStateTransition)` otherwise
    pub fn clear(current: CheckState, cleared_on: NaiveDate) -> Result<CheckTransition, LedgerError> {
        Self::ensure_pending(current, CheckState::Cleared)?;
        Ok(CheckTransition::Clear {
            new_state: CheckState::Cleared,
            cleared_on,
        })
    }

    /// Mark a pending check as bounced.
    ///
    /// Blank reasons are stored as absent.
    pub fn bounce(current: CheckState, reason: Option<String>) -> Result<CheckTransition, LedgerError> {
        Self::ensure_pending(current, CheckState::Bounced)?;
        Ok(CheckTransition::Bounce {
            new_state: CheckState::Bounced,
            reason: reason.filter(|r| !r.trim().is_empty()),
        })
    }

    /// Void a pending check. A reason is required.
    pub fn void(current: CheckState, reason: String) -> Result<CheckTransition, LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::validation("reason", "a void reason is required"));
        }
        Self::ensure_pending(current, CheckState::Voided)?;
        Ok(CheckTransition::Void {
            new_state: CheckState::Voided,
            reason,
        })
    }

    /// Validate an administrative edit.
    pub fn ensure_editable(current: CheckState, update: &CheckAdminUpdate) -> Result<(), LedgerError> {
        if current.is_terminal() {
            return Err(LedgerError::CheckNotEditable(current));
        }
        if update.is_empty() {
            return Err(LedgerError::validation("update", "no fields to update"));
        }
        if update.number.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(LedgerError::validation("number", "check number cannot be blank"));
        }
        if update.bank.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(LedgerError::validation("bank", "bank cannot be blank"));
        }
        Ok(())
    }

    /// Returns true if `from → to` is a legal transition.
    #[must_use]
    pub fn is_valid_transition(from: CheckState, to: CheckState) -> bool {
        matches!(
            (from, to),
            (
                CheckState::Pending,
                CheckState::Cleared | CheckState::Bounced | CheckState::Voided
            )
        )
    }

    fn ensure_pending(current: CheckState, to: CheckState) -> Result<(), LedgerError> {
        if current == CheckState::Pending {
            Ok(())
        } else {
            Err(LedgerError::InvalidStateTransition { from: current, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn test_clear_from_pending() {
        let transition = CheckLifecycle::clear(CheckState::Pending, today()).unwrap();
        assert_eq!(
            transition,
            CheckTransition::Clear {
                new_state: CheckState::Cleared,
                cleared_on: today(),
            }
        );
    }

    #[test]
    fn test_second_transition_fails() {
        let err = CheckLifecycle::bounce(CheckState::Cleared, None).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidStateTransition {
                from: CheckState::Cleared,
                to: CheckState::Bounced,
            }
        ));
        assert!(CheckLifecycle::clear(CheckState::Bounced, today()).is_err());
        assert!(CheckLifecycle::void(CheckState::Voided, "dup".into()).is_err());
    }

    #[test]
    fn test_bounce_drops_blank_reason() {
        let transition = CheckLifecycle::bounce(CheckState::Pending, Some("  ".into())).unwrap();
        assert_eq!(
            transition,
            CheckTransition::Bounce {
                new_state: CheckState::Bounced,
                reason: None,
            }
        );
    }

    #[test]
    fn test_void_requires_reason() {
        assert!(matches!(
            CheckLifecycle::void(CheckState::Pending, " ".into()),
            Err(LedgerError::Validation { .. })
        ));
        let transition = CheckLifecycle::void(CheckState::Pending, "entered twice".into()).unwrap();
        assert_eq!(transition.new_state(), CheckState::Voided);
    }

    #[test]
    fn test_admin_edits_only_while_pending() {
        let update = CheckAdminUpdate {
            notes: Some("call before deposit".into()),
            ..CheckAdminUpdate::default()
        };
        assert!(CheckLifecycle::ensure_editable(CheckState::Pending, &update).is_ok());
        assert!(matches!(
            CheckLifecycle::ensure_editable(CheckState::Cleared, &update),
            Err(LedgerError::CheckNotEditable(CheckState::Cleared))
        ));
        assert!(CheckLifecycle::ensure_editable(CheckState::Pending, &CheckAdminUpdate::default()).is_err());
    }
}
