//! Customer repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use cuentas_core::LedgerContext;
use cuentas_core::LedgerError;
use cuentas_core::catalog::{Customer, CustomerUpdate, NewCustomer};
use cuentas_shared::types::CustomerId;

use crate::entities::customers;
use crate::error::DbResultExt;
use crate::locking;

/// Filter for listing customers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Only active or inactive customers.
    pub active: Option<bool>,
    /// Name fragment.
    pub search: Option<String>,
}

impl From<customers::Model> for Customer {
    fn from(model: customers::Model) -> Self {
        Self {
            id: CustomerId::from_uuid(model.id),
            name: model.name,
            tax_id: model.tax_id,
            email: model.email,
            phone: model.phone,
            address: model.address,
            credit_limit: model.credit_limit,
            current_balance: model.current_balance,
            active: model.active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Customer repository.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
    ctx: LedgerContext,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, ctx: LedgerContext) -> Self {
        Self { db, ctx }
    }

    /// Creates a customer with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns a validation or storage error.
    pub async fn create(&self, input: NewCustomer) -> Result<Customer, LedgerError> {
        let input = input.validated()?;
        let model = customers::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            tax_id: Set(input.tax_id),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            credit_limit: Set(input.credit_limit),
            current_balance: Set(Decimal::ZERO),
            active: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.db)
        .await
        .map_db()?;

        tracing::info!(customer_id = %model.id, credit_limit = %model.credit_limit, "customer created");
        Ok(model.into())
    }

    /// Fetches a customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` or a storage error.
    pub async fn get(&self, customer_id: CustomerId) -> Result<Customer, LedgerError> {
        customers::Entity::find_by_id(customer_id.into_inner())
            .one(&self.db)
            .await
            .map_db()?
            .map(Customer::from)
            .ok_or(LedgerError::CustomerNotFound(customer_id))
    }

    /// Lists customers by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, LedgerError> {
        let mut query = customers::Entity::find();
        if let Some(active) = filter.active {
            query = query.filter(customers::Column::Active.eq(active));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(customers::Column::Name.contains(search));
        }
        let models = query
            .order_by_asc(customers::Column::Name)
            .all(&self.db)
            .await
            .map_db()?;
        Ok(models.into_iter().map(Customer::from).collect())
    }

    /// Updates contact data, credit limit, or active flag.
    ///
    /// Runs under the customer lock so a limit change never interleaves with a
    /// credit decision. The balance is never written here.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound`, a validation error, `Busy`, or a storage
    /// error.
    pub async fn update(
        &self,
        customer_id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, LedgerError> {
        let update = update.validated()?;
        let txn = locking::begin(&self.db, &self.ctx).await?;
        let guard = locking::lock_customer(&txn, customer_id).await?;

        let mut active: customers::ActiveModel = guard.customer().clone().into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(email) = update.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = update.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = update.address {
            active.address = Set(Some(address));
        }
        if let Some(limit) = update.credit_limit {
            active.credit_limit = Set(limit);
        }
        if let Some(flag) = update.active {
            active.active = Set(flag);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await.map_db()?;
        txn.commit().await.map_db()?;

        tracing::info!(customer_id = %customer_id, credit_limit = %updated.credit_limit, "customer updated");
        Ok(updated.into())
    }
}
