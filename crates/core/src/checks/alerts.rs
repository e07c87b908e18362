//! Due-date alerts for pending checks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Check, CheckState};

/// Urgency of a pending check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Due date has passed.
    Overdue,
    /// Due within the warning window.
    DueSoon,
    /// Due later than the warning window.
    Upcoming,
    /// Not postdated.
    NoDueDate,
}

/// A pending check with its alert classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAlert {
    /// The check.
    #[serde(flatten)]
    pub check: Check,
    /// Alert level.
    pub alert: AlertLevel,
    /// Days until the due date (negative when overdue).
    pub days_until_due: Option<i64>,
}

/// Classifies a due date relative to `today`.
#[must_use]
pub fn classify(due_date: Option<NaiveDate>, today: NaiveDate, warning_days: u32) -> AlertLevel {
    let Some(due) = due_date else {
        return AlertLevel::NoDueDate;
    };
    let days = (due - today).num_days();
    if days < 0 {
        AlertLevel::Overdue
    } else if days <= i64::from(warning_days) {
        AlertLevel::DueSoon
    } else {
        AlertLevel::Upcoming
    }
}

/// Keeps pending checks, classifies them, and orders them by due date.
///
/// Checks without a due date come last, ordered by issue date.
#[must_use]
pub fn pending_with_alerts(checks: Vec<Check>, today: NaiveDate, warning_days: u32) -> Vec<CheckAlert> {
    let mut alerts: Vec<CheckAlert> = checks
        .into_iter()
        .filter(|c| c.state == CheckState::Pending)
        .map(|check| CheckAlert {
            alert: classify(check.due_date, today, warning_days),
            days_until_due: check.due_date.map(|due| (due - today).num_days()),
            check,
        })
        .collect();

    alerts.sort_by(|a, b| {
        let key = |x: &CheckAlert| (x.check.due_date.is_none(), x.check.due_date, x.check.issue_date);
        key(a).cmp(&key(b))
    });
    alerts
}
