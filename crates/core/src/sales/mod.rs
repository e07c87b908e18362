//! Sales: catalog pricing, payment plans, and reconciliation.

pub mod plan;
pub mod reconcile;
pub mod types;

pub use plan::{PaymentInput, PlannedPayment, SalePaymentPlan};
pub use reconcile::{PaymentPosting, SaleReconciler, SaleReconciliation};
pub use types::{Payment, PaymentStatus, PricedSale, Sale, SaleLine, SaleLineInput, price_lines};
