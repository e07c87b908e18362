//! Running-account ledger logic.
//!
//! This module implements the customer ledger:
//! - Append-only debit/credit entries tagged by originating sale
//! - Balance and per-sale outstanding calculations
//! - FIFO payment allocation
//! - Credit ceiling enforcement
//! - Account statements
//! - Error types for every core operation

pub mod allocation;
pub mod balance;
pub mod credit;
pub mod entry;
pub mod error;
pub mod statement;

#[cfg(test)]
mod allocation_props;
#[cfg(test)]
mod balance_props;

pub use allocation::{AllocationOutcome, AllocationPlan, PaymentAllocator, SaleAllocation};
pub use balance::{BalanceCalculator, CustomerBalance, LedgerTotals, SaleOutstanding};
pub use credit::CreditLimitGuard;
pub use entry::{EntryKind, LedgerEntry, NewLedgerEntry};
pub use error::LedgerError;
pub use statement::{CustomerStatement, StatementLine, StatementLineType, build_statement};
