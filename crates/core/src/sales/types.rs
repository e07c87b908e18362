//! Sale domain types and catalog pricing.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use cuentas_shared::types::{
    CheckId, CustomerId, PaymentId, PaymentMethodId, ProductId, SaleId, UserId, round_money,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::ledger::LedgerError;
use crate::payment_method::PaymentMethodKind;

/// Derived payment status persisted on the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing collected or credited yet.
    Pending,
    /// Some money in, some still due.
    Partial,
    /// Nothing left due.
    Paid,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sale header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique identifier.
    pub id: SaleId,
    /// Buyer.
    pub customer_id: CustomerId,
    /// Business date.
    pub sale_date: NaiveDate,
    /// Total computed from catalog prices at creation. Immutable.
    pub total: Decimal,
    /// Derived payment status.
    pub payment_status: PaymentStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// User who created the sale.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A priced sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    /// Product sold.
    pub product_id: ProductId,
    /// Product name at the time of sale.
    pub description: String,
    /// Units sold.
    pub quantity: i32,
    /// Catalog price at the time of sale.
    pub unit_price: Decimal,
    /// `quantity × unit_price`, rounded to cents.
    pub line_total: Decimal,
}

/// A requested sale line. Carries no price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineInput {
    /// Product to sell.
    pub product_id: ProductId,
    /// Units to sell.
    pub quantity: i32,
}

/// A recorded payment. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Sale paid.
    pub sale_id: SaleId,
    /// Method used.
    pub method_id: PaymentMethodId,
    /// Kind of the method at recording time.
    pub method_kind: PaymentMethodKind,
    /// Amount.
    pub amount: Decimal,
    /// Business date.
    pub payment_date: NaiveDate,
    /// Check spawned by this payment.
    pub check_id: Option<CheckId>,
    /// User who recorded it.
    pub recorded_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Sale lines priced from the catalog, with the stock each product loses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    /// Priced lines in input order.
    pub lines: Vec<SaleLine>,
    /// Sum of line totals.
    pub total: Decimal,
    /// Units to take out of stock per product.
    pub stock_out: HashMap<ProductId, i32>,
}

/// Prices `items` from `products`, checking activity and stock.
///
/// `products` must contain every product referenced by `items`, read under the
/// same transaction that will decrement stock.
pub fn price_lines(items: &[SaleLineInput], products: &[Product]) -> Result<PricedSale, LedgerError> {
    if items.is_empty() {
        return Err(LedgerError::validation("items", "a sale needs at least one item"));
    }

    let catalog: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut lines = Vec::with_capacity(items.len());
    let mut stock_out: HashMap<ProductId, i32> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(LedgerError::validation(
                format!("items[{index}].quantity"),
                "quantity must be positive",
            ));
        }
        let product = catalog
            .get(&item.product_id)
            .ok_or(LedgerError::ProductNotFound(item.product_id))?;
        if !product.active {
            return Err(LedgerError::validation(
                format!("items[{index}].product_id"),
                format!("product '{}' is inactive", product.name),
            ));
        }

        let demanded = stock_out.entry(product.id).or_insert(0);
        *demanded = demanded.saturating_add(item.quantity);
        if *demanded > product.stock {
            return Err(LedgerError::InsufficientStock {
                product_id: product.id,
                available: product.stock,
                requested: *demanded,
            });
        }

        lines.push(SaleLine {
            product_id: product.id,
            description: product.name.clone(),
            quantity: item.quantity,
            unit_price: product.unit_price,
            line_total: round_money(product.unit_price * Decimal::from(item.quantity)),
        });
    }

    let total = lines.iter().map(|l| l.line_total).sum();
    Ok(PricedSale {
        lines,
        total,
        stock_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(price: Decimal, stock: i32, active: bool) -> Product {
        Product {
            id: ProductId::new(),
            sku: "SKU".into(),
            name: "Martillo".into(),
            unit_price: price,
            stock,
            active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_prices_from_catalog() {
        let a = product(dec!(12.50), 10, true);
        let b = product(dec!(3.33), 10, true);
        let priced = price_lines(
            &[
                SaleLineInput { product_id: a.id, quantity: 2 },
                SaleLineInput { product_id: b.id, quantity: 3 },
            ],
            &[a.clone(), b],
        )
        .unwrap();

        assert_eq!(priced.total, dec!(34.99));
        assert_eq!(priced.lines[0].unit_price, dec!(12.50));
        assert_eq!(priced.stock_out[&a.id], 2);
    }

    #[test]
    fn test_stock_is_checked_across_repeated_lines() {
        let a = product(dec!(1), 5, true);
        let err = price_lines(
            &[
                SaleLineInput { product_id: a.id, quantity: 3 },
                SaleLineInput { product_id: a.id, quantity: 3 },
            ],
            &[a.clone()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 5, requested: 6, .. }
        ));
    }

    #[test]
    fn test_rejects_empty_inactive_and_unknown() {
        let inactive = product(dec!(1), 5, false);
        assert!(price_lines(&[], &[]).is_err());
        assert!(matches!(
            price_lines(&[SaleLineInput { product_id: inactive.id, quantity: 1 }], &[inactive.clone()]),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            price_lines(&[SaleLineInput { product_id: ProductId::new(), quantity: 1 }], &[]),
            Err(LedgerError::ProductNotFound(_))
        ));
        assert!(matches!(
            price_lines(&[SaleLineInput { product_id: inactive.id, quantity: 0 }], &[inactive]),
            Err(LedgerError::Validation { .. })
        ));
    }
}
