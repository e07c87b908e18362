//! Product catalog repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use cuentas_core::LedgerError;
use cuentas_core::catalog::{NewProduct, Product};
use cuentas_shared::types::ProductId;

use crate::entities::products;
use crate::error::{DbResultExt, db_err, is_unique_violation};

/// Unique constraint Postgres generates for `products.sku`.
const SKU_UNIQUE: &str = "products_sku_key";

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: ProductId::from_uuid(model.id),
            sku: model.sku,
            name: model.name,
            unit_price: model.unit_price,
            stock: model.stock,
            active: model.active,
            created_at: model.created_at.into(),
        }
    }
}

/// Product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error (including a duplicate SKU) or a storage
    /// error.
    pub async fn create(&self, input: NewProduct) -> Result<Product, LedgerError> {
        let input = input.validated()?;
        let sku = input.sku.clone();
        let model = products::ActiveModel {
            id: Set(Uuid::now_v7()),
            sku: Set(input.sku),
            name: Set(input.name),
            unit_price: Set(input.unit_price),
            stock: Set(input.stock),
            active: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err, SKU_UNIQUE) {
                LedgerError::validation("sku", format!("SKU '{sku}' already exists"))
            } else {
                db_err(err)
            }
        })?;

        tracing::info!(product_id = %model.id, sku = %model.sku, "product created");
        Ok(model.into())
    }

    /// Fetches a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or a storage error.
    pub async fn get(&self, product_id: ProductId) -> Result<Product, LedgerError> {
        products::Entity::find_by_id(product_id.into_inner())
            .one(&self.db)
            .await
            .map_db()?
            .map(Product::from)
            .ok_or(LedgerError::ProductNotFound(product_id))
    }

    /// Lists products by SKU, optionally only active ones.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Product>, LedgerError> {
        let mut query = products::Entity::find();
        if active_only {
            query = query.filter(products::Column::Active.eq(true));
        }
        let models = query
            .order_by_asc(products::Column::Sku)
            .all(&self.db)
            .await
            .map_db()?;
        Ok(models.into_iter().map(Product::from).collect())
    }
}
