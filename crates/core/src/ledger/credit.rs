//! Credit ceiling enforcement for new running-account debt.

use cuentas_shared::types::{CustomerId, exceeds_with_tolerance};
use rust_decimal::Decimal;

use super::error::LedgerError;

/// Rejects new debt past the customer's credit ceiling.
///
/// Callers must evaluate the guard inside the same locked-customer transaction
/// that writes the debt, with `current_balance` read after taking the lock.
pub struct CreditLimitGuard;

impl CreditLimitGuard {
    /// Checks that `additional_debt` fits under `credit_limit`.
    ///
    /// A limit of zero means the customer is cash-only. The comparison allows a
    /// one-cent tolerance.
    pub fn ensure_within_limit(
        customer_id: CustomerId,
        credit_limit: Decimal,
        current_balance: Decimal,
        additional_debt: Decimal,
    ) -> Result<(), LedgerError> {
        if additional_debt <= Decimal::ZERO {
            return Ok(());
        }
        if credit_limit <= Decimal::ZERO {
            return Err(LedgerError::NoCreditExtended(customer_id));
        }
        if exceeds_with_tolerance(current_balance + additional_debt, credit_limit) {
            return Err(LedgerError::CreditLimitExceeded {
                customer_id,
                limit: credit_limit,
                balance: current_balance,
                requested: additional_debt,
            });
        }
        Ok(())
    }
}
