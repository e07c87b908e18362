//! Ledger entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use cuentas_shared::types::{CustomerId, LedgerEntryId, SaleId, UserId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::LedgerError;

/// Kind of running-account entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Debt registered for a sale charged to the running account.
    SaleDebt,
    /// Money received, whether through a check, an account payment, or a direct payment.
    Payment,
    /// Manual correction. Positive amounts debit, negative amounts credit.
    Adjustment,
}

impl EntryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaleDebt => "sale_debt",
            Self::Payment => "payment",
            Self::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted running-account entry.
///
/// Exactly one of `debit` and `credit` is non-zero. Entries are append-only:
/// corrections are new offsetting entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// Monotonic insertion order, used to break ties between same-day entries.
    pub sequence: i64,
    /// The customer whose account this entry belongs to.
    pub customer_id: CustomerId,
    /// The originating sale, if any.
    pub sale_id: Option<SaleId>,
    /// Entry kind.
    pub kind: EntryKind,
    /// Debit amount (zero for credits).
    pub debit: Decimal,
    /// Credit amount (zero for debits).
    pub credit: Decimal,
    /// Business date of the movement.
    pub entry_date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
    /// The back-office user who caused the entry.
    pub recorded_by: Option<UserId>,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns the unsigned amount of whichever side is set.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }
}

/// A validated entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Originating sale.
    pub sale_id: Option<SaleId>,
    /// Entry kind.
    pub kind: EntryKind,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Business date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: Option<String>,
    /// Acting user.
    pub recorded_by: Option<UserId>,
}

impl NewLedgerEntry {
    /// Builds an entry from a kind and an amount.
    ///
    /// `SaleDebt` debits and requires a sale; `Payment` credits; `Adjustment`
    /// debits when positive and credits when negative. Amounts are rounded to
    /// cents and must not round to zero.
    pub fn new(
        customer_id: CustomerId,
        kind: EntryKind,
        amount: Decimal,
        sale_id: Option<SaleId>,
        entry_date: NaiveDate,
    ) -> Result<Self, LedgerError> {
        let amount = round_money(amount);
        if amount.is_zero() {
            return Err(LedgerError::validation("amount", "amount cannot be zero"));
        }

        let (debit, credit) = match kind {
            EntryKind::SaleDebt => {
                if sale_id.is_none() {
                    return Err(LedgerError::validation(
                        "sale_id",
                        "a sale debt must reference its sale",
                    ));
                }
                (positive(amount)?, Decimal::ZERO)
            }
            EntryKind::Payment => (Decimal::ZERO, positive(amount)?),
            EntryKind::Adjustment if amount.is_sign_positive() => (amount, Decimal::ZERO),
            EntryKind::Adjustment => (Decimal::ZERO, -amount),
        };

        Ok(Self {
            customer_id,
            sale_id,
            kind,
            debit,
            credit,
            entry_date,
            description: None,
            recorded_by: None,
        })
    }

    /// Sale debt for `amount` against `sale_id`.
    pub fn sale_debt(
        customer_id: CustomerId,
        sale_id: SaleId,
        amount: Decimal,
        entry_date: NaiveDate,
    ) -> Result<Self, LedgerError> {
        Self::new(customer_id, EntryKind::SaleDebt, amount, Some(sale_id), entry_date)
    }

    /// Payment credit, optionally tagged to a sale.
    pub fn payment(
        customer_id: CustomerId,
        sale_id: Option<SaleId>,
        amount: Decimal,
        entry_date: NaiveDate,
    ) -> Result<Self, LedgerError> {
        Self::new(customer_id, EntryKind::Payment, amount, sale_id, entry_date)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn recorded_by(mut self, user: Option<UserId>) -> Self {
        self.recorded_by = user;
        self
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

fn positive(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.is_sign_negative() {
        return Err(LedgerError::validation("amount", "amount must be positive"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn test_sale_debt_is_a_debit() {
        let entry =
            NewLedgerEntry::sale_debt(CustomerId::new(), SaleId::new(), dec!(300), date()).unwrap();
        assert_eq!(entry.debit, dec!(300));
        assert_eq!(entry.credit, Decimal::ZERO);
        assert_eq!(entry.signed_amount(), dec!(300));
    }

    #[test]
    fn test_payment_is_a_credit_and_may_be_unlinked() {
        let entry = NewLedgerEntry::payment(CustomerId::new(), None, dec!(120.50), date()).unwrap();
        assert_eq!(entry.debit, Decimal::ZERO);
        assert_eq!(entry.credit, dec!(120.50));
        assert!(entry.sale_id.is_none());
    }

    #[test]
    fn test_negative_adjustment_becomes_credit() {
        let entry = NewLedgerEntry::new(
            CustomerId::new(),
            EntryKind::Adjustment,
            dec!(-15),
            None,
            date(),
        )
        .unwrap();
        assert_eq!(entry.credit, dec!(15));
        assert_eq!(entry.debit, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_zero_and_negative_amounts() {
        let customer = CustomerId::new();
        assert!(matches!(
            NewLedgerEntry::payment(customer, None, dec!(0.004), date()),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            NewLedgerEntry::payment(customer, None, dec!(-10), date()),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            NewLedgerEntry::new(customer, EntryKind::SaleDebt, dec!(10), None, date()),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_entry_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&EntryKind::SaleDebt).unwrap(),
            "\"sale_debt\""
        );
        assert_eq!(EntryKind::Adjustment.to_string(), "adjustment");
    }
}
