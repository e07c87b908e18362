//! Ledger error types for validation, business-rule, and storage errors.
//!
//! Every core operation reports failures through `LedgerError`. Business-rule
//! violations roll the surrounding transaction back and surface as 4xx responses;
//! storage failures and lock-wait exhaustion surface as retryable 5xx responses.

use cuentas_shared::AppError;
use cuentas_shared::types::{
    CheckId, CustomerId, PaymentMethodId, ProductId, SaleId, SupplierId,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::checks::CheckState;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Field-level input validation failure.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending input field.
        field: String,
        /// Human-readable description.
        message: String,
    },

    /// A sale line asks for more units than the product has in stock.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// The product.
        product_id: ProductId,
        /// Units currently in stock.
        available: i32,
        /// Units requested across the sale.
        requested: i32,
    },

    // ========== Business Rule Errors ==========
    /// The sale already has its `sale_debt` entry.
    #[error("Sale {0} already has a registered debt")]
    DuplicateDebt(SaleId),

    /// A check transition was attempted from a terminal state.
    #[error("Invalid check state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: CheckState,
        /// Requested state.
        to: CheckState,
    },

    /// Administrative fields of a check are frozen once it leaves pending.
    #[error("Check is {0} and can no longer be edited")]
    CheckNotEditable(CheckState),

    /// The customer is cash-only.
    #[error("Customer {0} has no credit extended")]
    NoCreditExtended(CustomerId),

    /// The new debt would push the customer past the credit ceiling.
    #[error(
        "Credit limit exceeded for customer {customer_id}: limit {limit}, balance {balance}, requested {requested}"
    )]
    CreditLimitExceeded {
        /// The customer.
        customer_id: CustomerId,
        /// Credit ceiling.
        limit: Decimal,
        /// Balance before the new debt.
        balance: Decimal,
        /// Additional debt requested.
        requested: Decimal,
    },

    /// Payments would exceed what the sale still owes.
    #[error("Payment of {amount} exceeds the payable amount {payable}")]
    Overpayment {
        /// Amount that can still be paid.
        payable: Decimal,
        /// Amount offered.
        amount: Decimal,
    },

    // ========== Not Found Errors ==========
    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Supplier not found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(SupplierId),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(SaleId),

    /// Check not found.
    #[error("Check not found: {0}")]
    CheckNotFound(CheckId),

    /// Payment method not found.
    #[error("Payment method not found: {0}")]
    PaymentMethodNotFound(PaymentMethodId),

    // ========== Concurrency Errors ==========
    /// A row lock could not be acquired within the configured wait.
    #[error("Resource is busy, please retry: {0}")]
    Busy(String),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Builds a field-level validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::DuplicateDebt(_) => "DUPLICATE_DEBT",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::CheckNotEditable(_) => "CHECK_NOT_EDITABLE",
            Self::NoCreditExtended(_) => "NO_CREDIT_EXTENDED",
            Self::CreditLimitExceeded { .. } => "CREDIT_LIMIT_EXCEEDED",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::SaleNotFound(_) => "SALE_NOT_FOUND",
            Self::CheckNotFound(_) => "CHECK_NOT_FOUND",
            Self::PaymentMethodNotFound(_) => "PAYMENT_METHOD_NOT_FOUND",
            Self::Busy(_) => "BUSY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation { .. } | Self::InsufficientStock { .. } => 400,

            // 404 Not Found
            Self::CustomerNotFound(_)
            | Self::SupplierNotFound(_)
            | Self::ProductNotFound(_)
            | Self::SaleNotFound(_)
            | Self::CheckNotFound(_)
            | Self::PaymentMethodNotFound(_) => 404,

            // 409 Conflict
            Self::DuplicateDebt(_) => 409,

            // 422 Unprocessable - business rules
            Self::InvalidStateTransition { .. }
            | Self::CheckNotEditable(_)
            | Self::NoCreditExtended(_)
            | Self::CreditLimitExceeded { .. }
            | Self::Overpayment { .. } => 422,

            // 503 Service Unavailable - lock wait exhausted
            Self::Busy(_) => 503,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Database(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let code = err.error_code();
        let message = err.to_string();
        match err {
            LedgerError::Validation { field, message } => Self::Validation {
                field: Some(field),
                message,
            },
            LedgerError::InsufficientStock { .. } => Self::Validation {
                field: Some("items".to_string()),
                message,
            },
            LedgerError::CustomerNotFound(_)
            | LedgerError::SupplierNotFound(_)
            | LedgerError::ProductNotFound(_)
            | LedgerError::SaleNotFound(_)
            | LedgerError::CheckNotFound(_)
            | LedgerError::PaymentMethodNotFound(_) => Self::NotFound(message),
            LedgerError::DuplicateDebt(_) => Self::Conflict { code, message },
            LedgerError::InvalidStateTransition { .. }
            | LedgerError::CheckNotEditable(_)
            | LedgerError::NoCreditExtended(_)
            | LedgerError::CreditLimitExceeded { .. }
            | LedgerError::Overpayment { .. } => Self::BusinessRule { code, message },
            LedgerError::Busy(msg) => Self::Busy(msg),
            LedgerError::Database(msg) => Self::Database(msg),
            LedgerError::Internal(msg) => Self::Internal(msg),
        }
    }
}
