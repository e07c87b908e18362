//! Customer balance and per-sale outstanding debt.

use std::collections::HashMap;

use chrono::NaiveDate;
use cuentas_shared::types::{CustomerId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::{EntryKind, LedgerEntry};

/// Debit and credit totals over a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

impl LedgerTotals {
    /// Creates totals from raw sums.
    #[must_use]
    pub const fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
        }
    }

    /// Adds a single entry.
    pub fn add(&mut self, entry: &LedgerEntry) {
        self.total_debit += entry.debit;
        self.total_credit += entry.credit;
    }

    /// Debit minus credit, unclamped.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.total_debit - self.total_credit
    }

    /// Amount owed: `max(0, debit - credit)`.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.net().max(Decimal::ZERO)
    }

    /// Credit held in the customer's favour: `max(0, credit - debit)`.
    #[must_use]
    pub fn surplus(&self) -> Decimal {
        (-self.net()).max(Decimal::ZERO)
    }
}

/// A customer's balance as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBalance {
    /// The customer.
    pub customer_id: CustomerId,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
    /// Amount owed, never negative.
    pub balance: Decimal,
    /// Overpayment held in the customer's favour.
    pub surplus: Decimal,
}

/// Outstanding debt of one sale on a customer's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOutstanding {
    /// The sale.
    pub sale_id: SaleId,
    /// Date of the sale's first debit.
    pub debt_date: NaiveDate,
    /// Insertion order of the sale's first debit.
    pub first_sequence: i64,
    /// Amount of the `sale_debt` entry, zero if none.
    pub original_debt: Decimal,
    /// Sum of debits tagged to the sale.
    pub debited: Decimal,
    /// Sum of credits tagged to the sale.
    pub credited: Decimal,
    /// `debited - credited`, unclamped.
    pub outstanding: Decimal,
}

/// Stateless balance calculations over ledger entries.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Sums debits and credits.
    pub fn totals<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> LedgerTotals {
        let mut totals = LedgerTotals::default();
        for entry in entries {
            totals.add(entry);
        }
        totals
    }

    /// Computes the customer's balance from their entries.
    pub fn balance_of(customer_id: CustomerId, entries: &[LedgerEntry]) -> CustomerBalance {
        let totals = Self::totals(entries.iter().filter(|e| e.customer_id == customer_id));
        Self::from_totals(customer_id, totals)
    }

    /// Builds a balance view from pre-aggregated totals.
    #[must_use]
    pub fn from_totals(customer_id: CustomerId, totals: LedgerTotals) -> CustomerBalance {
        CustomerBalance {
            customer_id,
            total_debit: totals.total_debit,
            total_credit: totals.total_credit,
            balance: totals.balance(),
            surplus: totals.surplus(),
        }
    }

    /// Per-sale outstanding debt, oldest debt first.
    ///
    /// Only sales that carry at least one debit are listed. Ordering is by the
    /// date of the sale's first debit, tie-broken by that entry's sequence.
    pub fn outstanding_by_sale(entries: &[LedgerEntry]) -> Vec<SaleOutstanding> {
        let mut by_sale: HashMap<SaleId, SaleOutstanding> = HashMap::new();
        let mut ordered: Vec<&LedgerEntry> = entries.iter().filter(|e| e.sale_id.is_some()).collect();
        ordered.sort_by_key(|e| e.sequence);

        for entry in ordered {
            let Some(sale_id) = entry.sale_id else {
                continue;
            };
            let row = by_sale.entry(sale_id).or_insert_with(|| SaleOutstanding {
                sale_id,
                debt_date: entry.entry_date,
                first_sequence: i64::MAX,
                original_debt: Decimal::ZERO,
                debited: Decimal::ZERO,
                credited: Decimal::ZERO,
                outstanding: Decimal::ZERO,
            });

            if entry.debit > Decimal::ZERO && row.first_sequence == i64::MAX {
                row.debt_date = entry.entry_date;
                row.first_sequence = entry.sequence;
            }
            if entry.kind == EntryKind::SaleDebt {
                row.original_debt += entry.debit;
            }
            row.debited += entry.debit;
            row.credited += entry.credit;
            row.outstanding = row.debited - row.credited;
        }

        let mut rows: Vec<SaleOutstanding> = by_sale
            .into_values()
            .filter(|row| row.first_sequence != i64::MAX)
            .collect();
        rows.sort_by(|a, b| {
            a.debt_date
                .cmp(&b.debt_date)
                .then(a.first_sequence.cmp(&b.first_sequence))
        });
        rows
    }
}
