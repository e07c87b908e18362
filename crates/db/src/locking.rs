//! Row locks for ledger mutations.
//!
//! Every mutation of a customer's money runs inside one transaction that holds
//! an exclusive lock on the customer row. Lock waits are bounded with
//! `SET LOCAL lock_timeout`, scoped to the transaction, so an exhausted wait
//! surfaces as [`LedgerError::Busy`] instead of blocking indefinitely.
//!
//! Lock order is customer, then check, then products. Products are locked in
//! ascending id order.
//!
//! # Usage
//!
//! ```ignore
//! let txn = locking::begin(&db, &ctx).await?;
//! let mut guard = locking::lock_customer(&txn, customer_id).await?;
//! LedgerRepository::record(&guard, entry).await?;
//! LedgerRepository::refresh_customer_balance(&mut guard).await?;
//! txn.commit().await?;
//! ```

use cuentas_core::LedgerContext;
use cuentas_core::LedgerError;
use cuentas_shared::types::{CheckId, CustomerId, ProductId};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{checks, customers, products};
use crate::error::DbResultExt;

/// Builds the statement that bounds lock waits for the current transaction.
fn lock_timeout_sql(timeout_ms: u128) -> String {
    format!("SET LOCAL lock_timeout = '{timeout_ms}ms'")
}

/// Begins a transaction with the configured lock timeout applied.
///
/// # Errors
///
/// Returns an error if the transaction cannot be started or the timeout
/// cannot be set.
pub async fn begin(
    db: &DatabaseConnection,
    ctx: &LedgerContext,
) -> Result<DatabaseTransaction, LedgerError> {
    let txn = db.begin().await.map_db()?;
    txn.execute_unprepared(&lock_timeout_sql(ctx.lock_timeout_ms()))
        .await
        .map_db()?;
    Ok(txn)
}

/// Proof that the customer row is exclusively locked by `txn`.
///
/// Ledger writes take a guard rather than a bare connection, so an entry can
/// only be appended while its owner is locked.
pub struct CustomerGuard<'t> {
    txn: &'t DatabaseTransaction,
    customer: customers::Model,
}

impl<'t> CustomerGuard<'t> {
    /// The transaction holding the lock.
    #[must_use]
    pub const fn txn(&self) -> &'t DatabaseTransaction {
        self.txn
    }

    /// The locked customer row as read after acquiring the lock.
    #[must_use]
    pub const fn customer(&self) -> &customers::Model {
        &self.customer
    }

    /// Id of the locked customer.
    #[must_use]
    pub fn customer_id(&self) -> CustomerId {
        CustomerId::from_uuid(self.customer.id)
    }

    pub(crate) fn replace(&mut self, customer: customers::Model) {
        self.customer = customer;
    }
}

/// Locks a customer row (`SELECT ... FOR UPDATE`).
///
/// # Errors
///
/// Returns `CustomerNotFound` if the row does not exist, or `Busy` if the lock
/// wait expires.
pub async fn lock_customer(
    txn: &DatabaseTransaction,
    customer_id: CustomerId,
) -> Result<CustomerGuard<'_>, LedgerError> {
    let customer = customers::Entity::find_by_id(customer_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_db()?
        .ok_or(LedgerError::CustomerNotFound(customer_id))?;

    tracing::debug!(customer_id = %customer_id, "customer row locked");
    Ok(CustomerGuard { txn, customer })
}

/// Locks a check row.
///
/// # Errors
///
/// Returns `CheckNotFound` if the row does not exist, or `Busy` if the lock
/// wait expires.
pub async fn lock_check(
    txn: &DatabaseTransaction,
    check_id: CheckId,
) -> Result<checks::Model, LedgerError> {
    checks::Entity::find_by_id(check_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_db()?
        .ok_or(LedgerError::CheckNotFound(check_id))
}

/// Locks the given product rows in ascending id order.
///
/// Missing products are simply absent from the result; pricing reports them.
///
/// # Errors
///
/// Returns `Busy` if the lock wait expires.
pub async fn lock_products(
    txn: &DatabaseTransaction,
    product_ids: &[ProductId],
) -> Result<Vec<products::Model>, LedgerError> {
    let mut ids: Vec<Uuid> = product_ids.iter().map(|id| id.into_inner()).collect();
    ids.sort_unstable();
    ids.dedup();

    products::Entity::find()
        .filter(products::Column::Id.is_in(ids))
        .order_by_asc(products::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_db()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_timeout_sql_format() {
        assert_eq!(lock_timeout_sql(3000), "SET LOCAL lock_timeout = '3000ms'");
    }
}
