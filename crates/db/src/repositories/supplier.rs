//! Supplier repository.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, QueryOrder, Set};
use uuid::Uuid;

use cuentas_core::LedgerError;
use cuentas_core::catalog::{NewSupplier, Supplier};
use cuentas_shared::types::SupplierId;

use crate::entities::suppliers;
use crate::error::DbResultExt;

impl From<suppliers::Model> for Supplier {
    fn from(model: suppliers::Model) -> Self {
        Self {
            id: SupplierId::from_uuid(model.id),
            name: model.name,
            tax_id: model.tax_id,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at.into(),
        }
    }
}

/// Supplier repository.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    db: DatabaseConnection,
}

impl SupplierRepository {
    /// Creates a new supplier repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a supplier.
    ///
    /// # Errors
    ///
    /// Returns a validation or storage error.
    pub async fn create(&self, input: NewSupplier) -> Result<Supplier, LedgerError> {
        let input = input.validated()?;
        let model = suppliers::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            tax_id: Set(input.tax_id),
            email: Set(input.email),
            phone: Set(input.phone),
            created_at: NotSet,
        }
        .insert(&self.db)
        .await
        .map_db()?;

        tracing::info!(supplier_id = %model.id, "supplier created");
        Ok(model.into())
    }

    /// Fetches a supplier.
    ///
    /// # Errors
    ///
    /// Returns `SupplierNotFound` or a storage error.
    pub async fn get(&self, supplier_id: SupplierId) -> Result<Supplier, LedgerError> {
        suppliers::Entity::find_by_id(supplier_id.into_inner())
            .one(&self.db)
            .await
            .map_db()?
            .map(Supplier::from)
            .ok_or(LedgerError::SupplierNotFound(supplier_id))
    }

    /// Lists suppliers by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self) -> Result<Vec<Supplier>, LedgerError> {
        let models = suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Name)
            .all(&self.db)
            .await
            .map_db()?;
        Ok(models.into_iter().map(Supplier::from).collect())
    }
}
