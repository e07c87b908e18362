//! Entity prelude.

pub use super::checks::Entity as Checks;
pub use super::customers::Entity as Customers;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::payment_methods::Entity as PaymentMethods;
pub use super::payments::Entity as Payments;
pub use super::products::Entity as Products;
pub use super::sale_items::Entity as SaleItems;
pub use super::sales::Entity as Sales;
pub use super::suppliers::Entity as Suppliers;
