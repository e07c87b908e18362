//! `SeaORM` entity definitions.

pub mod prelude;

pub mod checks;
pub mod customers;
pub mod ledger_entries;
pub mod payment_methods;
pub mod payments;
pub mod products;
pub mod sale_items;
pub mod sales;
pub mod sea_orm_active_enums;
pub mod suppliers;
