//! Ledger store: the append-only running account of each customer.
//!
//! Writes go through [`LedgerRepository::record`], which requires a
//! [`CustomerGuard`]. The cached `customers.current_balance` is recomputed in
//! exactly one place, [`LedgerRepository::refresh_customer_balance`].

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use cuentas_core::LedgerError;
use cuentas_core::ledger::{
    BalanceCalculator, CustomerBalance, CustomerStatement, EntryKind, LedgerEntry, LedgerTotals,
    NewLedgerEntry, SaleOutstanding, build_statement,
};
use cuentas_shared::types::{CustomerId, LedgerEntryId, SaleId, UserId};

use crate::entities::{customers, ledger_entries, sea_orm_active_enums};
use crate::error::{DbResultExt, db_err, is_unique_violation};
use crate::locking::CustomerGuard;

/// Partial unique index allowing one `sale_debt` entry per sale.
const SALE_DEBT_INDEX: &str = "uq_ledger_sale_debt";

/// Filter for listing ledger entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    /// Only entries tagged with this sale.
    pub sale_id: Option<SaleId>,
    /// Only entries of this kind.
    pub kind: Option<EntryKind>,
    /// Inclusive lower date bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub date_to: Option<NaiveDate>,
}

impl From<ledger_entries::Model> for LedgerEntry {
    fn from(model: ledger_entries::Model) -> Self {
        Self {
            id: LedgerEntryId::from_uuid(model.id),
            sequence: model.sequence,
            customer_id: CustomerId::from_uuid(model.customer_id),
            sale_id: model.sale_id.map(SaleId::from_uuid),
            kind: model.kind.into(),
            debit: model.debit,
            credit: model.credit,
            entry_date: model.entry_date,
            description: model.description,
            recorded_by: model.recorded_by.map(UserId::from_uuid),
            created_at: model.created_at.into(),
        }
    }
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Writes (locked)
    // ========================================================================

    /// Appends an entry to the locked customer's ledger.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateDebt` if the entry is a second `sale_debt` for its
    /// sale, or a storage error.
    pub async fn record(
        guard: &CustomerGuard<'_>,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, LedgerError> {
        if entry.customer_id != guard.customer_id() {
            return Err(LedgerError::Internal(format!(
                "ledger entry for customer {} recorded under the lock of {}",
                entry.customer_id,
                guard.customer_id()
            )));
        }

        if entry.kind == EntryKind::SaleDebt
            && let Some(sale_id) = entry.sale_id
            && Self::original_debt(guard.txn(), sale_id).await? > Decimal::ZERO
        {
            return Err(LedgerError::DuplicateDebt(sale_id));
        }

        let sale_id = entry.sale_id;
        let kind: sea_orm_active_enums::EntryKind = entry.kind.into();
        let model = ledger_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            sequence: NotSet,
            customer_id: Set(entry.customer_id.into_inner()),
            sale_id: Set(sale_id.map(SaleId::into_inner)),
            kind: Set(kind),
            debit: Set(entry.debit),
            credit: Set(entry.credit),
            entry_date: Set(entry.entry_date),
            description: Set(entry.description),
            recorded_by: Set(entry.recorded_by.map(UserId::into_inner)),
            created_at: NotSet,
        }
        .insert(guard.txn())
        .await
        .map_err(|err| match sale_id {
            Some(sale_id) if is_unique_violation(&err, SALE_DEBT_INDEX) => {
                LedgerError::DuplicateDebt(sale_id)
            }
            _ => db_err(err),
        })?;

        let recorded = LedgerEntry::from(model);
        tracing::debug!(
            customer_id = %recorded.customer_id,
            sale_id = ?recorded.sale_id,
            kind = %recorded.kind,
            debit = %recorded.debit,
            credit = %recorded.credit,
            "ledger entry recorded"
        );
        Ok(recorded)
    }

    /// Recomputes the cached balance of the locked customer from its entries.
    ///
    /// Called inside the transaction after every ledger write.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn refresh_customer_balance(
        guard: &mut CustomerGuard<'_>,
    ) -> Result<Decimal, LedgerError> {
        let totals = Self::customer_totals(guard.txn(), guard.customer_id()).await?;
        let balance = totals.balance();

        if guard.customer().current_balance != balance {
            let mut active: customers::ActiveModel = guard.customer().clone().into();
            active.current_balance = Set(balance);
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(guard.txn()).await.map_db()?;
            guard.replace(updated);
        }

        Ok(balance)
    }

    // ========================================================================
    // Reads usable inside a transaction
    // ========================================================================

    /// Lists a customer's entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn entries_for<C: ConnectionTrait>(
        conn: &C,
        customer_id: CustomerId,
        filter: &EntryFilter,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::CustomerId.eq(customer_id.into_inner()));

        if let Some(sale_id) = filter.sale_id {
            query = query.filter(ledger_entries::Column::SaleId.eq(sale_id.into_inner()));
        }
        if let Some(kind) = filter.kind {
            let kind: sea_orm_active_enums::EntryKind = kind.into();
            query = query.filter(ledger_entries::Column::Kind.eq(kind));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(ledger_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(ledger_entries::Column::EntryDate.lte(to));
        }

        let models = query
            .order_by_asc(ledger_entries::Column::Sequence)
            .all(conn)
            .await
            .map_db()?;
        Ok(models.into_iter().map(LedgerEntry::from).collect())
    }

    /// Lists the entries tagged with a sale in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn entries_for_sale<C: ConnectionTrait>(
        conn: &C,
        sale_id: SaleId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::SaleId.eq(sale_id.into_inner()))
            .order_by_asc(ledger_entries::Column::Sequence)
            .all(conn)
            .await
            .map_db()?;
        Ok(models.into_iter().map(LedgerEntry::from).collect())
    }

    /// Debit and credit totals of a sale's entries.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn sale_totals<C: ConnectionTrait>(
        conn: &C,
        sale_id: SaleId,
    ) -> Result<LedgerTotals, LedgerError> {
        let entries = Self::entries_for_sale(conn, sale_id).await?;
        Ok(BalanceCalculator::totals(&entries))
    }

    /// Total debited against a sale.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn sum_debits<C: ConnectionTrait>(
        conn: &C,
        sale_id: SaleId,
    ) -> Result<Decimal, LedgerError> {
        Ok(Self::sale_totals(conn, sale_id).await?.total_debit)
    }

    /// Total credited against a sale.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn sum_credits<C: ConnectionTrait>(
        conn: &C,
        sale_id: SaleId,
    ) -> Result<Decimal, LedgerError> {
        Ok(Self::sale_totals(conn, sale_id).await?.total_credit)
    }

    /// Amount of the sale's `sale_debt` entry, zero if none.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn original_debt<C: ConnectionTrait>(
        conn: &C,
        sale_id: SaleId,
    ) -> Result<Decimal, LedgerError> {
        let debt = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::SaleId.eq(sale_id.into_inner()))
            .filter(ledger_entries::Column::Kind.eq(sea_orm_active_enums::EntryKind::SaleDebt))
            .one(conn)
            .await
            .map_db()?;
        Ok(debt.map_or(Decimal::ZERO, |entry| entry.debit))
    }

    /// Debit and credit totals over all of a customer's entries.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn customer_totals<C: ConnectionTrait>(
        conn: &C,
        customer_id: CustomerId,
    ) -> Result<LedgerTotals, LedgerError> {
        let entries = Self::entries_for(conn, customer_id, &EntryFilter::default()).await?;
        Ok(BalanceCalculator::totals(&entries))
    }

    // ========================================================================
    // Read APIs
    // ========================================================================

    /// Lists a customer's entries.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` or a storage error.
    pub async fn entries(
        &self,
        customer_id: CustomerId,
        filter: &EntryFilter,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.ensure_customer(customer_id).await?;
        Self::entries_for(&self.db, customer_id, filter).await
    }

    /// Current balance and surplus of a customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` or a storage error.
    pub async fn balance_of(&self, customer_id: CustomerId) -> Result<CustomerBalance, LedgerError> {
        self.ensure_customer(customer_id).await?;
        let totals = Self::customer_totals(&self.db, customer_id).await?;
        Ok(BalanceCalculator::from_totals(customer_id, totals))
    }

    /// Sales still carrying running-account debt, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` or a storage error.
    pub async fn outstanding_by_sale(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<SaleOutstanding>, LedgerError> {
        self.ensure_customer(customer_id).await?;
        let entries = Self::entries_for(&self.db, customer_id, &EntryFilter::default()).await?;
        Ok(BalanceCalculator::outstanding_by_sale(&entries)
            .into_iter()
            .filter(|row| row.outstanding > Decimal::ZERO)
            .collect())
    }

    /// Chronological account statement with running balance.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound`, a validation error for an inverted date
    /// range, or a storage error.
    pub async fn statement(
        &self,
        customer_id: CustomerId,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<CustomerStatement, LedgerError> {
        self.ensure_customer(customer_id).await?;
        // Opening balance needs everything before date_from.
        let filter = EntryFilter {
            date_to,
            ..EntryFilter::default()
        };
        let entries = Self::entries_for(&self.db, customer_id, &filter).await?;
        build_statement(customer_id, &entries, date_from, date_to)
    }

    async fn ensure_customer(&self, customer_id: CustomerId) -> Result<(), LedgerError> {
        customers::Entity::find_by_id(customer_id.into_inner())
            .one(&self.db)
            .await
            .map_db()?
            .map(|_| ())
            .ok_or(LedgerError::CustomerNotFound(customer_id))
    }
}
