//! Payment method repository.

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use cuentas_core::LedgerError;
use cuentas_core::payment_method::{PaymentMethod, PaymentMethodRegistry};
use cuentas_shared::types::PaymentMethodId;

use crate::entities::payment_methods;
use crate::error::DbResultExt;

impl From<payment_methods::Model> for PaymentMethod {
    fn from(model: payment_methods::Model) -> Self {
        Self {
            id: PaymentMethodId::from_uuid(model.id),
            name: model.name,
            kind: model.kind.into(),
            active: model.active,
        }
    }
}

/// Payment method repository.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    db: DatabaseConnection,
}

impl PaymentMethodRepository {
    /// Creates a new payment method repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists all payment methods, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self) -> Result<Vec<PaymentMethod>, LedgerError> {
        let models = payment_methods::Entity::find()
            .order_by_asc(payment_methods::Column::Name)
            .all(&self.db)
            .await
            .map_db()?;
        Ok(models.into_iter().map(PaymentMethod::from).collect())
    }

    /// Loads the registry used to resolve methods by id at runtime.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn load_registry(&self) -> Result<PaymentMethodRegistry, LedgerError> {
        let methods = self.list().await?;
        tracing::info!(count = methods.len(), "payment method registry loaded");
        Ok(PaymentMethodRegistry::new(methods))
    }
}
