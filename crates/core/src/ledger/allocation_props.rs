//! Property-based tests for the FIFO allocator.

use chrono::NaiveDate;
use cuentas_shared::types::SaleId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::PaymentAllocator;
use super::balance::SaleOutstanding;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn debts_strategy() -> impl Strategy<Value = Vec<SaleOutstanding>> {
    prop::collection::vec(positive_amount(), 0..12).prop_map(|amounts| {
        amounts
            .into_iter()
            .enumerate()
            .map(|(i, outstanding)| SaleOutstanding {
                sale_id: SaleId::new(),
                debt_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                first_sequence: i64::try_from(i).unwrap(),
                original_debt: outstanding,
                debited: outstanding,
                credited: Decimal::ZERO,
                outstanding,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Allocated plus surplus always equals the payment.
    #[test]
    fn prop_allocation_conserves_money(amount in positive_amount(), debts in debts_strategy()) {
        let plan = PaymentAllocator::allocate(amount, &debts).unwrap();
        prop_assert_eq!(plan.allocated_total() + plan.surplus, amount);
    }

    /// No sale receives more than it owes.
    #[test]
    fn prop_never_over_allocates(amount in positive_amount(), debts in debts_strategy()) {
        let plan = PaymentAllocator::allocate(amount, &debts).unwrap();
        for (alloc, debt) in plan.allocations.iter().zip(&debts) {
            prop_assert_eq!(alloc.sale_id, debt.sale_id);
            prop_assert!(alloc.amount <= debt.outstanding);
            prop_assert!(alloc.remaining_after >= Decimal::ZERO);
        }
    }

    /// Surplus appears only once every debt is fully settled.
    #[test]
    fn prop_surplus_matches_shortfall(amount in positive_amount(), debts in debts_strategy()) {
        let total: Decimal = debts.iter().map(|d| d.outstanding).sum();
        let plan = PaymentAllocator::allocate(amount, &debts).unwrap();
        if amount >= total {
            prop_assert_eq!(plan.surplus, amount - total);
            prop_assert!(plan.allocations.iter().all(|a| a.remaining_after.is_zero()));
        } else {
            prop_assert_eq!(plan.surplus, Decimal::ZERO);
        }
    }

    /// Only the last touched sale may be left partially paid.
    #[test]
    fn prop_fifo_prefix(amount in positive_amount(), debts in debts_strategy()) {
        let plan = PaymentAllocator::allocate(amount, &debts).unwrap();
        if let Some((_, head)) = plan.allocations.split_last() {
            prop_assert!(head.iter().all(|a| a.remaining_after.is_zero()));
        }
    }
}
