//! Property-based tests for the balance calculator.

use chrono::{NaiveDate, Utc};
use cuentas_shared::types::{CustomerId, LedgerEntryId, SaleId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::BalanceCalculator;
use super::entry::{EntryKind, LedgerEntry};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// (is_debit, amount, sale index or none, day)
fn raw_entries() -> impl Strategy<Value = Vec<(bool, Decimal, Option<usize>, u32)>> {
    prop::collection::vec(
        (any::<bool>(), positive_amount(), prop::option::of(0usize..4), 1u32..28),
        0..30,
    )
}

fn build(customer_id: CustomerId, raw: &[(bool, Decimal, Option<usize>, u32)]) -> Vec<LedgerEntry> {
    let sales: Vec<SaleId> = (0..4).map(|_| SaleId::new()).collect();
    raw.iter()
        .enumerate()
        .map(|(i, (is_debit, amount, sale, day))| LedgerEntry {
            id: LedgerEntryId::new(),
            sequence: i64::try_from(i).unwrap() + 1,
            customer_id,
            sale_id: sale.map(|s| sales[s]),
            kind: if *is_debit { EntryKind::Adjustment } else { EntryKind::Payment },
            debit: if *is_debit { *amount } else { Decimal::ZERO },
            credit: if *is_debit { Decimal::ZERO } else { *amount },
            entry_date: NaiveDate::from_ymd_opt(2026, 4, *day).unwrap(),
            description: None,
            recorded_by: None,
            created_at: Utc::now(),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// balance = max(0, Σdebit − Σcredit), surplus is the mirror image.
    #[test]
    fn prop_balance_is_floored_net(raw in raw_entries()) {
        let customer = CustomerId::new();
        let entries = build(customer, &raw);
        let debit: Decimal = entries.iter().map(|e| e.debit).sum();
        let credit: Decimal = entries.iter().map(|e| e.credit).sum();

        let balance = BalanceCalculator::balance_of(customer, &entries);
        prop_assert_eq!(balance.balance, (debit - credit).max(Decimal::ZERO));
        prop_assert_eq!(balance.surplus, (credit - debit).max(Decimal::ZERO));
        prop_assert!(balance.balance.is_zero() || balance.surplus.is_zero());
    }

    /// Outstanding rows are sorted by (debt date, first sequence).
    #[test]
    fn prop_outstanding_is_fifo_ordered(raw in raw_entries()) {
        let entries = build(CustomerId::new(), &raw);
        let rows = BalanceCalculator::outstanding_by_sale(&entries);
        for pair in rows.windows(2) {
            prop_assert!(
                (pair[0].debt_date, pair[0].first_sequence) < (pair[1].debt_date, pair[1].first_sequence)
            );
        }
        for row in &rows {
            prop_assert_eq!(row.outstanding, row.debited - row.credited);
        }
    }
}
