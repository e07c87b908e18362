//! Owed-versus-collected view of one sale.
//!
//! The view combines three sources: direct payments, checks linked to the
//! sale, and the sale's running-account entries.
//!
//! - `collected` is money actually in hand: direct payments plus cleared checks.
//! - `outstanding` is the part of the total neither collected nor ever charged
//!   to the running account: `total - (collected + ledger_debt_original)`.
//! - `unassigned` is the part of the total neither paid directly nor ever
//!   charged to the running account: `total - (direct_collected +
//!   ledger_debt_original)`. Cleared checks are not subtracted here because
//!   their amount already sits in `ledger_debt_original` and their clearing
//!   already reduced `ledger_debt`.
//! - `ledger_debt` is what the running account still holds for the sale.
//! - `amount_due = unassigned + ledger_debt` is everything still owed.

use cuentas_shared::types::{MONEY_TOLERANCE, SaleId, clamp_dust, exceeds_with_tolerance};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Payment, PaymentStatus};
use crate::checks::{Check, CheckState};
use crate::ledger::{LedgerError, LedgerTotals};
use crate::payment_method::PaymentMethodKind;

/// Reconciled amounts of one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReconciliation {
    /// The sale.
    pub sale_id: SaleId,
    /// Sale total.
    pub total: Decimal,
    /// Payments by methods that collect immediately.
    pub direct_collected: Decimal,
    /// `direct_collected + checks_cleared`.
    pub collected: Decimal,
    /// Linked checks awaiting their outcome.
    pub checks_pending: Decimal,
    /// Linked checks collected.
    pub checks_cleared: Decimal,
    /// Linked checks rejected by the bank.
    pub checks_bounced: Decimal,
    /// Linked checks cancelled.
    pub checks_voided: Decimal,
    /// Amount of the sale's `sale_debt` entry, zero if none.
    pub ledger_debt_original: Decimal,
    /// Live debit minus credit on the sale, floored at zero.
    pub ledger_debt: Decimal,
    /// Credits posted against the sale.
    pub ledger_credited: Decimal,
    /// Part of the total not collected and never charged to the account.
    pub outstanding: Decimal,
    /// Part of the total neither paid directly nor charged to the account.
    pub unassigned: Decimal,
    /// Everything still owed: `unassigned + ledger_debt`.
    pub amount_due: Decimal,
    /// Derived payment status.
    pub payment_status: PaymentStatus,
}

/// Where a payment recorded after creation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPosting {
    /// Money collected now. `ledger_credit` is the part settling account debt.
    Collected {
        /// Credit to post against the sale.
        ledger_credit: Decimal,
    },
    /// Outstanding converted into running-account debt.
    Debt {
        /// Debt to register.
        amount: Decimal,
        /// Whether a pending check must be created.
        spawns_check: bool,
    },
}

impl SaleReconciliation {
    /// Amount a direct payment may settle right now.
    ///
    /// Account debt covered by a pending check is not payable until the check
    /// bounces.
    #[must_use]
    pub fn payable_now(&self) -> Decimal {
        self.unassigned + (self.ledger_debt - self.checks_pending).max(Decimal::ZERO)
    }

    /// Decides how a new payment of `kind` and `amount` is posted.
    pub fn plan_payment(&self, kind: PaymentMethodKind, amount: Decimal) -> Result<PaymentPosting, LedgerError> {
        if kind.registers_debt() {
            if self.ledger_debt_original > Decimal::ZERO {
                return Err(LedgerError::DuplicateDebt(self.sale_id));
            }
            if exceeds_with_tolerance(amount, self.unassigned) {
                return Err(LedgerError::Overpayment {
                    payable: self.unassigned,
                    amount,
                });
            }
            return Ok(PaymentPosting::Debt {
                amount,
                spawns_check: kind.spawns_check(),
            });
        }

        let payable = self.payable_now();
        if exceeds_with_tolerance(amount, payable) {
            return Err(LedgerError::Overpayment { payable, amount });
        }
        let settleable = (self.ledger_debt - self.checks_pending).max(Decimal::ZERO);
        let ledger_credit = clamp_dust(amount - self.unassigned).min(settleable);
        Ok(PaymentPosting::Collected { ledger_credit })
    }
}

/// Stateless sale reconciliation.
pub struct SaleReconciler;

impl SaleReconciler {
    /// Builds the reconciled view.
    ///
    /// `payments` and `checks` must belong to the sale; `ledger` holds the
    /// sale's debit and credit totals and `ledger_debt_original` its
    /// `sale_debt` amount.
    pub fn reconcile(
        sale_id: SaleId,
        total: Decimal,
        payments: &[Payment],
        checks: &[Check],
        ledger: LedgerTotals,
        ledger_debt_original: Decimal,
    ) -> SaleReconciliation {
        let direct_collected: Decimal = payments
            .iter()
            .filter(|p| p.method_kind.counts_as_collected())
            .map(|p| p.amount)
            .sum();

        let bucket = |state: CheckState| -> Decimal {
            checks
                .iter()
                .filter(|c| c.state == state)
                .map(|c| c.amount)
                .sum()
        };
        let checks_pending = bucket(CheckState::Pending);
        let checks_cleared = bucket(CheckState::Cleared);
        let checks_bounced = bucket(CheckState::Bounced);
        let checks_voided = bucket(CheckState::Voided);

        let collected = direct_collected + checks_cleared;
        let ledger_debt = ledger.balance();
        let outstanding = clamp_dust(total - (collected + ledger_debt_original));
        let unassigned = clamp_dust(total - (direct_collected + ledger_debt_original));
        let amount_due = unassigned + ledger_debt;

        let payment_status = if amount_due <= MONEY_TOLERANCE {
            PaymentStatus::Paid
        } else if collected.is_zero() && ledger.total_credit.is_zero() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Partial
        };

        SaleReconciliation {
            sale_id,
            total,
            direct_collected,
            collected,
            checks_pending,
            checks_cleared,
            checks_bounced,
            checks_voided,
            ledger_debt_original,
            ledger_debt,
            ledger_credited: ledger.total_credit,
            outstanding,
            unassigned,
            amount_due,
            payment_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckParty;
    use chrono::{NaiveDate, Utc};
    use cuentas_shared::types::{CheckId, CustomerId, PaymentId, PaymentMethodId};
    use rust_decimal_macros::dec;

    fn payment(sale_id: SaleId, kind: PaymentMethodKind, amount: Decimal) -> Payment {
        Payment {
            id: PaymentId::new(),
            sale_id,
            method_id: PaymentMethodId::new(),
            method_kind: kind,
            amount,
            payment_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            check_id: None,
            recorded_by: None,
            created_at: Utc::now(),
        }
    }

    fn check(sale_id: SaleId, state: CheckState, amount: Decimal) -> Check {
        Check {
            id: CheckId::new(),
            number: "1".into(),
            bank: "Banco".into(),
            amount,
            issue_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            due_date: None,
            state,
            party: CheckParty::Received {
                customer_id: CustomerId::new(),
                sale_id: Some(sale_id),
            },
            cleared_on: None,
            state_reason: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cash_plus_account_debt_scenario() {
        // total 500, cash 200, 300 charged to the running account
        let sale = SaleId::new();
        let rec = SaleReconciler::reconcile(
            sale,
            dec!(500),
            &[
                payment(sale, PaymentMethodKind::Cash, dec!(200)),
                payment(sale, PaymentMethodKind::RunningAccount, dec!(300)),
            ],
            &[],
            LedgerTotals::new(dec!(300), dec!(0)),
            dec!(300),
        );

        assert_eq!(rec.collected, dec!(200));
        assert_eq!(rec.ledger_debt_original, dec!(300));
        assert_eq!(rec.ledger_debt, dec!(300));
        assert_eq!(rec.outstanding, Decimal::ZERO);
        assert_eq!(rec.amount_due, dec!(300));
        assert_eq!(rec.payment_status, PaymentStatus::Partial);
        assert_eq!(rec.payable_now(), dec!(300));
    }

    #[test]
    fn test_clearing_raises_collected_and_settles() {
        let sale = SaleId::new();
        let pending = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &[payment(sale, PaymentMethodKind::Check, dec!(400))],
            &[check(sale, CheckState::Pending, dec!(400))],
            LedgerTotals::new(dec!(400), dec!(0)),
            dec!(400),
        );
        assert_eq!(pending.collected, Decimal::ZERO);
        assert_eq!(pending.payment_status, PaymentStatus::Pending);
        assert_eq!(pending.payable_now(), Decimal::ZERO);

        let cleared = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &[payment(sale, PaymentMethodKind::Check, dec!(400))],
            &[check(sale, CheckState::Cleared, dec!(400))],
            LedgerTotals::new(dec!(400), dec!(400)),
            dec!(400),
        );
        assert_eq!(cleared.collected - pending.collected, dec!(400));
        assert_eq!(cleared.amount_due, Decimal::ZERO);
        assert_eq!(cleared.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_bounce_leaves_outstanding_and_reopens_debt() {
        let sale = SaleId::new();
        let payments = [
            payment(sale, PaymentMethodKind::Cash, dec!(100)),
            payment(sale, PaymentMethodKind::Check, dec!(250)),
        ];
        let ledger = LedgerTotals::new(dec!(250), dec!(0));

        let before = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &payments,
            &[check(sale, CheckState::Pending, dec!(250))],
            ledger,
            dec!(250),
        );
        let after = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &payments,
            &[check(sale, CheckState::Bounced, dec!(250))],
            ledger,
            dec!(250),
        );

        assert_eq!(before.outstanding, dec!(50));
        assert_eq!(after.outstanding, before.outstanding);
        assert_eq!(after.checks_bounced, dec!(250));
        assert_eq!(before.payable_now(), dec!(50));
        assert_eq!(after.payable_now(), dec!(300));
    }

    #[test]
    fn test_cleared_check_counts_once_against_remainder() {
        // total 400, cash 100, check 250 now cleared, 50 never assigned
        let sale = SaleId::new();
        let payments = [
            payment(sale, PaymentMethodKind::Cash, dec!(100)),
            payment(sale, PaymentMethodKind::Check, dec!(250)),
        ];
        let rec = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &payments,
            &[check(sale, CheckState::Cleared, dec!(250))],
            LedgerTotals::new(dec!(250), dec!(250)),
            dec!(250),
        );

        assert_eq!(rec.collected, dec!(350));
        assert_eq!(rec.outstanding, Decimal::ZERO);
        assert_eq!(rec.unassigned, dec!(50));
        assert_eq!(rec.ledger_debt, Decimal::ZERO);
        assert_eq!(rec.amount_due, dec!(50));
        assert_eq!(rec.payment_status, PaymentStatus::Partial);
        assert_eq!(rec.payable_now(), dec!(50));
        assert_eq!(
            rec.plan_payment(PaymentMethodKind::Cash, dec!(50)).unwrap(),
            PaymentPosting::Collected { ledger_credit: Decimal::ZERO }
        );

        let settled = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &[
                payments[0].clone(),
                payments[1].clone(),
                payment(sale, PaymentMethodKind::Cash, dec!(50)),
            ],
            &[check(sale, CheckState::Cleared, dec!(250))],
            LedgerTotals::new(dec!(250), dec!(250)),
            dec!(250),
        );
        assert_eq!(settled.amount_due, Decimal::ZERO);
        assert_eq!(settled.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_direct_payment_past_remainder_settles_account() {
        // total 400, cash 100, 250 on account, then cash 100 of which 50 is credited
        let sale = SaleId::new();
        let rec = SaleReconciler::reconcile(
            sale,
            dec!(400),
            &[
                payment(sale, PaymentMethodKind::Cash, dec!(100)),
                payment(sale, PaymentMethodKind::RunningAccount, dec!(250)),
                payment(sale, PaymentMethodKind::Cash, dec!(100)),
            ],
            &[],
            LedgerTotals::new(dec!(250), dec!(50)),
            dec!(250),
        );

        assert_eq!(rec.unassigned, Decimal::ZERO);
        assert_eq!(rec.ledger_debt, dec!(200));
        assert_eq!(rec.amount_due, dec!(200));
        assert_eq!(rec.payable_now(), dec!(200));
    }

    #[test]
    fn test_plan_direct_payment_splits_outstanding_and_ledger() {
        let sale = SaleId::new();
        let rec = SaleReconciler::reconcile(
            sale,
            dec!(500),
            &[
                payment(sale, PaymentMethodKind::Cash, dec!(100)),
                payment(sale, PaymentMethodKind::RunningAccount, dec!(300)),
            ],
            &[],
            LedgerTotals::new(dec!(300), dec!(0)),
            dec!(300),
        );
        assert_eq!(rec.outstanding, dec!(100));

        assert_eq!(
            rec.plan_payment(PaymentMethodKind::Cash, dec!(150)).unwrap(),
            PaymentPosting::Collected { ledger_credit: dec!(50) }
        );
        assert_eq!(
            rec.plan_payment(PaymentMethodKind::Transfer, dec!(80)).unwrap(),
            PaymentPosting::Collected { ledger_credit: Decimal::ZERO }
        );
        assert!(matches!(
            rec.plan_payment(PaymentMethodKind::Cash, dec!(401)),
            Err(LedgerError::Overpayment { payable, .. }) if payable == dec!(400)
        ));
    }

    #[test]
    fn test_plan_debt_payment_rules() {
        let sale = SaleId::new();
        let no_debt = SaleReconciler::reconcile(
            sale,
            dec!(300),
            &[payment(sale, PaymentMethodKind::Cash, dec!(100))],
            &[],
            LedgerTotals::default(),
            Decimal::ZERO,
        );
        assert_eq!(no_debt.payment_status, PaymentStatus::Partial);
        assert_eq!(
            no_debt.plan_payment(PaymentMethodKind::Check, dec!(200)).unwrap(),
            PaymentPosting::Debt { amount: dec!(200), spawns_check: true }
        );
        assert!(matches!(
            no_debt.plan_payment(PaymentMethodKind::RunningAccount, dec!(250)),
            Err(LedgerError::Overpayment { .. })
        ));

        let with_debt = SaleReconciler::reconcile(
            sale,
            dec!(300),
            &[],
            &[],
            LedgerTotals::new(dec!(100), dec!(0)),
            dec!(100),
        );
        assert!(matches!(
            with_debt.plan_payment(PaymentMethodKind::RunningAccount, dec!(50)),
            Err(LedgerError::DuplicateDebt(id)) if id == sale
        ));
    }
}
