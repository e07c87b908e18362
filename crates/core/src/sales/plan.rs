//! Payment plan for a sale being created.

use cuentas_shared::types::{PaymentMethodId, exceeds_with_tolerance, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checks::CheckDetails;
use crate::ledger::LedgerError;
use crate::payment_method::{PaymentMethodKind, PaymentMethodRegistry};

/// A payment offered with a sale or against an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Method used.
    pub method_id: PaymentMethodId,
    /// Amount.
    pub amount: Decimal,
    /// Required for check methods, refused otherwise.
    #[serde(default)]
    pub check: Option<CheckDetails>,
}

/// A payment resolved against the method registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPayment {
    /// Method used.
    pub method_id: PaymentMethodId,
    /// Kind of the method.
    pub kind: PaymentMethodKind,
    /// Amount, rounded to cents.
    pub amount: Decimal,
    /// Check to create in the pending state.
    pub check: Option<CheckDetails>,
}

impl PlannedPayment {
    /// Resolves and validates one payment.
    pub fn resolve(input: PaymentInput, registry: &PaymentMethodRegistry) -> Result<Self, LedgerError> {
        let kind = registry.resolve(input.method_id)?.kind;
        let amount = round_money(input.amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::validation("amount", "payment amount must be positive"));
        }

        match (&input.check, kind.spawns_check()) {
            (Some(details), true) => details.validate()?,
            (None, true) => {
                return Err(LedgerError::validation(
                    "check",
                    "check details are required for check payments",
                ));
            }
            (Some(_), false) => {
                return Err(LedgerError::validation(
                    "check",
                    "check details are only accepted for check payments",
                ));
            }
            (None, false) => {}
        }

        Ok(Self {
            method_id: input.method_id,
            kind,
            amount,
            check: input.check,
        })
    }
}

/// How the payments offered at sale creation split up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePaymentPlan {
    /// Resolved payments in input order.
    pub payments: Vec<PlannedPayment>,
    /// Sum of immediately collected payments.
    pub direct_collected: Decimal,
    /// Sum of running-account payments.
    pub account_debt: Decimal,
    /// Sum of check payments.
    pub check_debt: Decimal,
    /// Part of the total not covered by any payment.
    pub unassigned: Decimal,
}

impl SalePaymentPlan {
    /// Resolves `inputs` and checks they do not exceed `total`.
    pub fn build(
        total: Decimal,
        inputs: Vec<PaymentInput>,
        registry: &PaymentMethodRegistry,
    ) -> Result<Self, LedgerError> {
        let payments = inputs
            .into_iter()
            .map(|input| PlannedPayment::resolve(input, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut direct_collected = Decimal::ZERO;
        let mut account_debt = Decimal::ZERO;
        let mut check_debt = Decimal::ZERO;
        for payment in &payments {
            match payment.kind {
                PaymentMethodKind::RunningAccount => account_debt += payment.amount,
                PaymentMethodKind::Check => check_debt += payment.amount,
                _ => direct_collected += payment.amount,
            }
        }

        let offered = direct_collected + account_debt + check_debt;
        if exceeds_with_tolerance(offered, total) {
            return Err(LedgerError::Overpayment {
                payable: total,
                amount: offered,
            });
        }

        Ok(Self {
            payments,
            direct_collected,
            account_debt,
            check_debt,
            unassigned: (total - offered).max(Decimal::ZERO),
        })
    }

    /// Debt to register on the running account: running-account plus check payments.
    #[must_use]
    pub fn debt_to_register(&self) -> Decimal {
        self.account_debt + self.check_debt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment_method::PaymentMethod;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Methods {
        registry: PaymentMethodRegistry,
        cash: PaymentMethodId,
        account: PaymentMethodId,
        check: PaymentMethodId,
    }

    fn methods() -> Methods {
        let make = |name: &str, kind| PaymentMethod {
            id: PaymentMethodId::new(),
            name: name.into(),
            kind,
            active: true,
        };
        let cash = make("Efectivo", PaymentMethodKind::Cash);
        let account = make("Cuenta corriente", PaymentMethodKind::RunningAccount);
        let check = make("Cheque", PaymentMethodKind::Check);
        Methods {
            cash: cash.id,
            account: account.id,
            check: check.id,
            registry: PaymentMethodRegistry::new([cash, account, check]),
        }
    }

    fn details() -> CheckDetails {
        CheckDetails {
            number: "00012345".into(),
            bank: "Banco Nación".into(),
            issue_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            notes: None,
        }
    }

    #[test]
    fn test_splits_direct_account_and_check() {
        let m = methods();
        let plan = SalePaymentPlan::build(
            dec!(500),
            vec![
                PaymentInput { method_id: m.cash, amount: dec!(100), check: None },
                PaymentInput { method_id: m.account, amount: dec!(150), check: None },
                PaymentInput { method_id: m.check, amount: dec!(200), check: Some(details()) },
            ],
            &m.registry,
        )
        .unwrap();

        assert_eq!(plan.direct_collected, dec!(100));
        assert_eq!(plan.debt_to_register(), dec!(350));
        assert_eq!(plan.unassigned, dec!(50));
    }

    #[test]
    fn test_overpayment_is_rejected_beyond_tolerance() {
        let m = methods();
        let ok = SalePaymentPlan::build(
            dec!(100),
            vec![PaymentInput { method_id: m.cash, amount: dec!(100.01), check: None }],
            &m.registry,
        );
        assert!(ok.is_ok());

        let err = SalePaymentPlan::build(
            dec!(100),
            vec![
                PaymentInput { method_id: m.cash, amount: dec!(60), check: None },
                PaymentInput { method_id: m.account, amount: dec!(41), check: None },
            ],
            &m.registry,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Overpayment { amount, .. } if amount == dec!(101)));
    }

    #[test]
    fn test_check_details_must_match_method() {
        let m = methods();
        assert!(
            SalePaymentPlan::build(
                dec!(100),
                vec![PaymentInput { method_id: m.check, amount: dec!(10), check: None }],
                &m.registry,
            )
            .is_err()
        );
        assert!(
            SalePaymentPlan::build(
                dec!(100),
                vec![PaymentInput { method_id: m.cash, amount: dec!(10), check: Some(details()) }],
                &m.registry,
            )
            .is_err()
        );
    }
}
