//! Postdated check domain types.

use chrono::{DateTime, NaiveDate, Utc};
use cuentas_shared::types::{CheckId, CustomerId, SaleId, SupplierId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::LedgerError;

/// Check state.
///
/// `Pending` is the only initial state. The valid transitions are:
/// - Pending → Cleared (funds collected)
/// - Pending → Bounced (rejected by the bank)
/// - Pending → Voided (administrative cancellation)
///
/// Every other state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    /// Awaiting its due date or deposit.
    Pending,
    /// Collected (terminal).
    Cleared,
    /// Rejected by the bank (terminal).
    Bounced,
    /// Cancelled by an administrator (terminal).
    Voided,
}

impl CheckState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cleared => "cleared",
            Self::Bounced => "bounced",
            Self::Voided => "voided",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "cleared" => Some(Self::Cleared),
            "bounced" => Some(Self::Bounced),
            "voided" => Some(Self::Voided),
            _ => None,
        }
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of the business a check sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckDirection {
    /// Received from a customer.
    Received,
    /// Issued to a supplier.
    Issued,
}

impl CheckDirection {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Issued => "issued",
        }
    }
}

/// Direction-specific relations of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum CheckParty {
    /// Check received from a customer, optionally paying a specific sale.
    Received {
        /// Drawer of the check.
        customer_id: CustomerId,
        /// Sale it pays, or `None` for an account payment.
        sale_id: Option<SaleId>,
    },
    /// Check issued to a supplier. Never touches the customer ledger.
    Issued {
        /// Payee.
        supplier_id: SupplierId,
    },
}

impl CheckParty {
    /// Returns the direction tag.
    #[must_use]
    pub fn direction(&self) -> CheckDirection {
        match self {
            Self::Received { .. } => CheckDirection::Received,
            Self::Issued { .. } => CheckDirection::Issued,
        }
    }

    /// Customer for received checks.
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::Received { customer_id, .. } => Some(*customer_id),
            Self::Issued { .. } => None,
        }
    }

    /// Linked sale for received checks.
    #[must_use]
    pub fn sale_id(&self) -> Option<SaleId> {
        match self {
            Self::Received { sale_id, .. } => *sale_id,
            Self::Issued { .. } => None,
        }
    }
}

/// A postdated check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Unique identifier.
    pub id: CheckId,
    /// Check number as printed.
    pub number: String,
    /// Drawee bank.
    pub bank: String,
    /// Face amount.
    pub amount: Decimal,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Earliest deposit date, if postdated.
    pub due_date: Option<NaiveDate>,
    /// Lifecycle state.
    pub state: CheckState,
    /// Direction and relations.
    #[serde(flatten)]
    pub party: CheckParty,
    /// Date the check cleared.
    pub cleared_on: Option<NaiveDate>,
    /// Reason given when bounced or voided.
    pub state_reason: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Check data supplied with a check payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetails {
    /// Check number.
    pub number: String,
    /// Drawee bank.
    pub bank: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date, if postdated.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckDetails {
    /// Validates the details.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.number.trim().is_empty() {
            return Err(LedgerError::validation("check.number", "check number is required"));
        }
        if self.bank.trim().is_empty() {
            return Err(LedgerError::validation("check.bank", "bank is required"));
        }
        if let Some(due) = self.due_date
            && due < self.issue_date
        {
            return Err(LedgerError::validation(
                "check.due_date",
                "due date cannot precede the issue date",
            ));
        }
        Ok(())
    }
}

/// A validated check waiting to be stored in the pending state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheck {
    /// Check data.
    pub details: CheckDetails,
    /// Face amount, rounded to cents.
    pub amount: Decimal,
    /// Direction and relations.
    pub party: CheckParty,
}

impl NewCheck {
    /// Validates details and amount.
    pub fn new(details: CheckDetails, amount: Decimal, party: CheckParty) -> Result<Self, LedgerError> {
        details.validate()?;
        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::validation("amount", "check amount must be positive"));
        }
        Ok(Self {
            details,
            amount,
            party,
        })
    }
}

/// A validated state change with the data to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckTransition {
    /// Pending → Cleared.
    Clear {
        /// New state.
        new_state: CheckState,
        /// Clearing date.
        cleared_on: NaiveDate,
    },
    /// Pending → Bounced.
    Bounce {
        /// New state.
        new_state: CheckState,
        /// Bank's reason, if given.
        reason: Option<String>,
    },
    /// Pending → Voided.
    Void {
        /// New state.
        new_state: CheckState,
        /// Administrative reason.
        reason: String,
    },
}

impl CheckTransition {
    /// Target state of the transition.
    #[must_use]
    pub fn new_state(&self) -> CheckState {
        match self {
            Self::Clear { new_state, .. }
            | Self::Bounce { new_state, .. }
            | Self::Void { new_state, .. } => *new_state,
        }
    }
}

/// Administrative edits allowed while a check is pending.
///
/// The face amount is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAdminUpdate {
    /// New check number.
    pub number: Option<String>,
    /// New bank.
    pub bank: Option<String>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New notes.
    pub notes: Option<String>,
}

impl CheckAdminUpdate {
    /// Returns true if nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.number.is_none() && self.bank.is_none() && self.due_date.is_none() && self.notes.is_none()
    }
}
