//! Shared harness for database integration tests.
//!
//! Tests run against `CUENTAS_TEST_DATABASE_URL` and are skipped when it is
//! unset. Migrations run once per test binary; every test creates its own
//! customers and products so tests never share rows.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;
use uuid::Uuid;

use cuentas_core::LedgerContext;
use cuentas_core::catalog::{NewCustomer, NewProduct};
use cuentas_core::payment_method::PaymentMethodKind;
use cuentas_core::sales::{PaymentInput, SaleLineInput};
use cuentas_db::migration::Migrator;
use cuentas_db::repositories::{CreateSaleInput, SaleDetail};
use cuentas_db::{
    AllocationRepository, CheckRepository, CustomerRepository, LedgerRepository,
    PaymentMethodRepository, ProductRepository, SaleRepository, SupplierRepository,
};
use cuentas_shared::types::{CustomerId, PaymentMethodId, ProductId};

static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub struct Harness {
    pub db: DatabaseConnection,
    pub ctx: LedgerContext,
    methods: HashMap<PaymentMethodKind, PaymentMethodId>,
}

/// Connects and migrates, or returns `None` when no test database is configured.
pub async fn harness() -> Option<Harness> {
    let Ok(url) = std::env::var("CUENTAS_TEST_DATABASE_URL") else {
        eprintln!("CUENTAS_TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let db = cuentas_db::connect(&url).await.expect("connect to test database");
    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("run migrations");
        })
        .await;

    let registry = PaymentMethodRepository::new(db.clone())
        .load_registry()
        .await
        .expect("load payment methods");
    let mut methods = HashMap::new();
    for method in registry.all() {
        if method.active {
            methods.entry(method.kind).or_insert(method.id);
        }
    }
    let ctx = LedgerContext::new(registry, Duration::from_millis(3000), 7);

    Some(Harness { db, ctx, methods })
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

impl Harness {
    pub fn method(&self, kind: PaymentMethodKind) -> PaymentMethodId {
        *self.methods.get(&kind).expect("seeded payment method")
    }

    pub fn pay(&self, kind: PaymentMethodKind, amount: Decimal) -> PaymentInput {
        PaymentInput {
            method_id: self.method(kind),
            amount,
            check: None,
        }
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.db.clone(), self.ctx.clone())
    }

    pub fn checks(&self) -> CheckRepository {
        CheckRepository::new(self.db.clone(), self.ctx.clone())
    }

    pub fn allocation(&self) -> AllocationRepository {
        AllocationRepository::new(self.db.clone(), self.ctx.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.db.clone(), self.ctx.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.db.clone())
    }

    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.db.clone())
    }

    pub async fn customer(&self, credit_limit: Decimal) -> CustomerId {
        self.customers()
            .create(NewCustomer {
                name: format!("Customer {}", Uuid::new_v4()),
                credit_limit,
                ..NewCustomer::default()
            })
            .await
            .expect("create customer")
            .id
    }

    /// Creates a product priced at `price` with plenty of stock.
    pub async fn product(&self, price: Decimal) -> ProductId {
        self.product_with_stock(price, 1_000).await
    }

    pub async fn product_with_stock(&self, price: Decimal, stock: i32) -> ProductId {
        ProductRepository::new(self.db.clone())
            .create(NewProduct {
                sku: format!("SKU-{}", Uuid::new_v4()),
                name: "Test product".to_string(),
                unit_price: price,
                stock,
            })
            .await
            .expect("create product")
            .id
    }

    /// Creates a one-line sale of a fresh product priced at `total`.
    pub async fn sale(
        &self,
        customer_id: CustomerId,
        total: Decimal,
        sale_date: NaiveDate,
        payments: Vec<PaymentInput>,
    ) -> SaleDetail {
        self.try_sale(customer_id, total, sale_date, payments)
            .await
            .expect("create sale")
    }

    pub async fn try_sale(
        &self,
        customer_id: CustomerId,
        total: Decimal,
        sale_date: NaiveDate,
        payments: Vec<PaymentInput>,
    ) -> Result<SaleDetail, cuentas_core::LedgerError> {
        let product_id = self.product(total).await;
        self.sales()
            .create_sale(
                CreateSaleInput {
                    customer_id,
                    sale_date: Some(sale_date),
                    items: vec![SaleLineInput {
                        product_id,
                        quantity: 1,
                    }],
                    payments,
                    notes: None,
                },
                None,
            )
            .await
    }
}
