//! FIFO allocation of an incoming payment over outstanding sale debts.

use cuentas_shared::types::{LedgerEntryId, SaleId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::SaleOutstanding;
use super::entry::LedgerEntry;
use super::error::LedgerError;

/// Part of a payment applied to one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleAllocation {
    /// The sale credited.
    pub sale_id: SaleId,
    /// Amount applied.
    pub amount: Decimal,
    /// Sale outstanding after this allocation.
    pub remaining_after: Decimal,
}

/// How a payment splits over a customer's debts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Allocations in FIFO order.
    pub allocations: Vec<SaleAllocation>,
    /// Money left after every debt was settled.
    pub surplus: Decimal,
}

impl AllocationPlan {
    /// Sum of all sale allocations.
    #[must_use]
    pub fn allocated_total(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}

/// Result of a committed allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Ledger entries written, in order.
    pub entries_created: Vec<LedgerEntry>,
    /// Sales that received part of the payment.
    pub sales_affected: Vec<SaleId>,
    /// Unapplied remainder, posted as an unlinked credit.
    pub surplus: Decimal,
    /// Entry holding the surplus, if any.
    pub surplus_entry_id: Option<LedgerEntryId>,
    /// Customer balance after the allocation.
    pub balance_after: Decimal,
}

/// Stateless FIFO allocator.
pub struct PaymentAllocator;

impl PaymentAllocator {
    /// Plans the allocation of `amount` over `debts`.
    ///
    /// `debts` must already be in FIFO order (see
    /// [`BalanceCalculator::outstanding_by_sale`](super::BalanceCalculator::outstanding_by_sale)).
    /// Sales with nothing outstanding are skipped, and no sale ever receives
    /// more than its outstanding.
    pub fn allocate(amount: Decimal, debts: &[SaleOutstanding]) -> Result<AllocationPlan, LedgerError> {
        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::validation("amount", "amount must be positive"));
        }

        let mut remaining = amount;
        let mut allocations = Vec::new();

        for debt in debts {
            if remaining.is_zero() {
                break;
            }
            if debt.outstanding <= Decimal::ZERO {
                continue;
            }
            let applied = remaining.min(debt.outstanding);
            remaining -= applied;
            allocations.push(SaleAllocation {
                sale_id: debt.sale_id,
                amount: applied,
                remaining_after: debt.outstanding - applied,
            });
        }

        Ok(AllocationPlan {
            allocations,
            surplus: remaining,
        })
    }
}
