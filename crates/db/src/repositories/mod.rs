//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every repository that moves money holds the [`LedgerContext`] and runs each
//! operation as one transaction under [`crate::locking`].
//!
//! [`LedgerContext`]: cuentas_core::LedgerContext

pub mod allocation;
pub mod check;
pub mod customer;
pub mod ledger;
pub mod payment_method;
pub mod product;
pub mod sale;
pub mod supplier;

pub use allocation::{
    AccountPaymentResult, AdjustmentInput, AdjustmentRecorded, AllocationRepository,
    CustomerPaymentInput,
};
pub use check::{
    CheckCleared, CheckFilter, CheckRepository, ClearingEffect, IssueSupplierCheckInput,
};
pub use customer::{CustomerFilter, CustomerRepository};
pub use ledger::{EntryFilter, LedgerRepository};
pub use payment_method::PaymentMethodRepository;
pub use product::ProductRepository;
pub use sale::{
    CreateSaleInput, PaymentRecorded, RecordPaymentInput, SaleDetail, SaleFilter, SaleRepository,
};
pub use supplier::SupplierRepository;
