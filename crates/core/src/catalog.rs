//! Customers, suppliers, and products.

use chrono::{DateTime, Utc};
use cuentas_shared::types::{CustomerId, ProductId, SupplierId, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// A customer with a running account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier.
    pub id: CustomerId,
    /// Display name.
    pub name: String,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Credit ceiling. Zero means cash only.
    pub credit_limit: Decimal,
    /// Cached balance, always equal to the ledger-derived balance.
    pub current_balance: Decimal,
    /// Inactive customers stay readable.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Display name.
    pub name: String,
    /// Tax identifier.
    #[serde(default)]
    pub tax_id: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Credit ceiling.
    #[serde(default)]
    pub credit_limit: Decimal,
}

impl NewCustomer {
    /// Validates and normalizes the input.
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        self.name = required("name", &self.name)?;
        self.credit_limit = credit_limit(self.credit_limit)?;
        Ok(self)
    }
}

/// Contact and credit-limit changes. The balance is never updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New credit ceiling.
    pub credit_limit: Option<Decimal>,
    /// Activate or deactivate.
    pub active: Option<bool>,
}

impl CustomerUpdate {
    /// Validates and normalizes the input.
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        if let Some(name) = &self.name {
            self.name = Some(required("name", name)?);
        }
        if let Some(limit) = self.credit_limit {
            self.credit_limit = Some(credit_limit(limit)?);
        }
        Ok(self)
    }
}

/// A supplier receiving issued checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    /// Unique identifier.
    pub id: SupplierId,
    /// Display name.
    pub name: String,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    /// Display name.
    pub name: String,
    /// Tax identifier.
    #[serde(default)]
    pub tax_id: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewSupplier {
    /// Validates and normalizes the input.
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        self.name = required("name", &self.name)?;
        Ok(self)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Current unit price. Sales always price from here.
    pub unit_price: Decimal,
    /// Units on hand.
    pub stock: i32,
    /// Inactive products cannot be sold.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Initial stock.
    #[serde(default)]
    pub stock: i32,
}

impl NewProduct {
    /// Validates and normalizes the input.
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        self.sku = required("sku", &self.sku)?;
        self.name = required("name", &self.name)?;
        self.unit_price = round_money(self.unit_price);
        if self.unit_price.is_sign_negative() {
            return Err(LedgerError::validation("unit_price", "price cannot be negative"));
        }
        if self.stock < 0 {
            return Err(LedgerError::validation("stock", "stock cannot be negative"));
        }
        Ok(self)
    }
}

fn required(field: &str, value: &str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn credit_limit(limit: Decimal) -> Result<Decimal, LedgerError> {
    let limit = round_money(limit);
    if limit.is_sign_negative() && !limit.is_zero() {
        return Err(LedgerError::validation("credit_limit", "credit limit cannot be negative"));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_customer_trims_and_validates() {
        let customer = NewCustomer {
            name: "  Ferretería Sur ".into(),
            credit_limit: dec!(1500),
            ..NewCustomer::default()
        }
        .validated()
        .unwrap();
        assert_eq!(customer.name, "Ferretería Sur");

        assert!(NewCustomer::default().validated().is_err());
        assert!(
            NewCustomer {
                name: "X".into(),
                credit_limit: dec!(-1),
                ..NewCustomer::default()
            }
            .validated()
            .is_err()
        );
    }

    #[test]
    fn test_customer_update_rejects_negative_limit() {
        let update = CustomerUpdate {
            credit_limit: Some(dec!(-10)),
            ..CustomerUpdate::default()
        };
        assert!(matches!(update.validated(), Err(LedgerError::Validation { field, .. }) if field == "credit_limit"));
    }

    #[test]
    fn test_new_product_validation() {
        let product = NewProduct {
            sku: "TOR-10".into(),
            name: "Tornillo".into(),
            unit_price: dec!(12.345),
            stock: 10,
        }
        .validated()
        .unwrap();
        assert_eq!(product.unit_price, dec!(12.34));

        let negative_stock = NewProduct {
            sku: "X".into(),
            name: "X".into(),
            unit_price: dec!(1),
            stock: -1,
        };
        assert!(negative_stock.validated().is_err());
    }
}
