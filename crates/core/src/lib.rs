//! Core business logic for Cuentas.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the `db` crate
//! feeds them rows read under lock and persists what they decide.
//!
//! # Modules
//!
//! - `ledger` - Running-account entries, balances, FIFO allocation, credit limits
//! - `checks` - Postdated check lifecycle and due-date alerts
//! - `sales` - Sale pricing, payment plans, and reconciliation
//! - `catalog` - Customers, suppliers, and products
//! - `payment_method` - Payment method kinds and the per-process registry
//! - `context` - Explicit ledger context passed to services

pub mod catalog;
pub mod checks;
pub mod context;
pub mod ledger;
pub mod payment_method;
pub mod sales;

pub use context::LedgerContext;
pub use ledger::LedgerError;
