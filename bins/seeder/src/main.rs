//! Demo data seeder for Cuentas development and testing.
//!
//! Seeds customers, products, and a supplier, then runs a handful of sales
//! and payments through the repositories so balances, checks, and statements
//! have something to show. Requires the migrator to have run first.
//!
//! Usage: cargo run --bin seeder

use std::time::Duration;

use anyhow::{Context, anyhow};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cuentas_core::LedgerContext;
use cuentas_core::catalog::{Customer, NewCustomer, NewProduct, NewSupplier, Product};
use cuentas_core::checks::CheckDetails;
use cuentas_core::payment_method::{PaymentMethodKind, PaymentMethodRegistry};
use cuentas_core::sales::{PaymentInput, SaleLineInput};
use cuentas_db::repositories::{
    CreateSaleInput, CustomerFilter, CustomerPaymentInput, IssueSupplierCheckInput,
};
use cuentas_db::{
    AllocationRepository, CheckRepository, CustomerRepository, PaymentMethodRepository,
    ProductRepository, SaleRepository, SupplierRepository,
};
use cuentas_shared::types::{CustomerId, PaymentMethodId, ProductId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = cuentas_db::connect(&database_url).await?;

    let registry = PaymentMethodRepository::new(db.clone())
        .load_registry()
        .await?;
    let methods = Methods::from_registry(&registry)?;
    let ctx = LedgerContext::new(registry, Duration::from_secs(3), 7);

    let customers = CustomerRepository::new(db.clone(), ctx.clone());
    if !customers.list(&CustomerFilter::default()).await?.is_empty() {
        println!("Customers already exist, skipping.");
        return Ok(());
    }

    println!("Seeding catalog...");
    let products = ProductRepository::new(db.clone());
    let flour = seed_product(&products, "HAR-001", "Harina 000 x 25kg", dec!(18500)).await?;
    let oil = seed_product(&products, "ACE-005", "Aceite girasol x 5L", dec!(9200)).await?;
    let sugar = seed_product(&products, "AZU-010", "Azúcar x 10kg", dec!(11300)).await?;

    println!("Seeding customers...");
    let bakery = seed_customer(&customers, "Panadería San Martín", dec!(250000)).await?;
    let grocer = seed_customer(&customers, "Almacén Don Luis", dec!(80000)).await?;
    let walk_in = seed_customer(&customers, "Consumidor final", Decimal::ZERO).await?;

    let today = Utc::now().date_naive();
    let days_ago = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(today);
    let sales = SaleRepository::new(db.clone(), ctx.clone());

    println!("Seeding sales...");
    // Half cash, half on account.
    sales
        .create_sale(
            sale(
                bakery.id,
                days_ago(40),
                vec![line(flour.id, 4), line(sugar.id, 2)],
                vec![
                    pay(methods.cash, dec!(48300)),
                    pay(methods.running_account, dec!(48300)),
                ],
            ),
            None,
        )
        .await?;
    // Entirely on account.
    sales
        .create_sale(
            sale(
                bakery.id,
                days_ago(20),
                vec![line(oil.id, 5)],
                vec![pay(methods.running_account, dec!(46000))],
            ),
            None,
        )
        .await?;
    // Paid with a postdated check.
    sales
        .create_sale(
            sale(
                grocer.id,
                days_ago(10),
                vec![line(sugar.id, 3)],
                vec![PaymentInput {
                    method_id: methods.check,
                    amount: dec!(33900),
                    check: Some(check_details(
                        "00045123",
                        days_ago(10),
                        today.checked_add_days(Days::new(5)),
                    )),
                }],
            ),
            None,
        )
        .await?;
    // Cash-only customer.
    sales
        .create_sale(
            sale(
                walk_in.id,
                today,
                vec![line(oil.id, 1)],
                vec![pay(methods.cash, dec!(9200))],
            ),
            None,
        )
        .await?;

    println!("Seeding account payment...");
    AllocationRepository::new(db.clone(), ctx.clone())
        .allocate_customer_payment(
            bakery.id,
            CustomerPaymentInput {
                amount: dec!(60000),
                payment_date: Some(days_ago(5)),
                method_id: Some(methods.cash),
                check: None,
                description: None,
            },
            None,
        )
        .await?;

    println!("Seeding supplier check...");
    let supplier = SupplierRepository::new(db.clone())
        .create(NewSupplier {
            name: "Molino Harinero del Sur".to_string(),
            ..NewSupplier::default()
        })
        .await?;
    CheckRepository::new(db, ctx)
        .issue_supplier_check(
            IssueSupplierCheckInput {
                supplier_id: supplier.id,
                amount: dec!(150000),
                details: check_details("88001", days_ago(15), Some(days_ago(2))),
            },
            None,
        )
        .await?;

    println!("Seeding complete!");
    Ok(())
}

/// Seeded method ids by kind.
struct Methods {
    cash: PaymentMethodId,
    check: PaymentMethodId,
    running_account: PaymentMethodId,
}

impl Methods {
    fn from_registry(registry: &PaymentMethodRegistry) -> anyhow::Result<Self> {
        let id = |kind: PaymentMethodKind| {
            registry
                .first_of_kind(kind)
                .map(|method| method.id)
                .ok_or_else(|| anyhow!("no active {kind} payment method; run the migrator first"))
        };
        Ok(Self {
            cash: id(PaymentMethodKind::Cash)?,
            check: id(PaymentMethodKind::Check)?,
            running_account: id(PaymentMethodKind::RunningAccount)?,
        })
    }
}

async fn seed_product(
    repo: &ProductRepository,
    sku: &str,
    name: &str,
    unit_price: Decimal,
) -> anyhow::Result<Product> {
    let product = repo
        .create(NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price,
            stock: 100,
        })
        .await?;
    println!("  {} ({})", product.name, product.sku);
    Ok(product)
}

async fn seed_customer(
    repo: &CustomerRepository,
    name: &str,
    credit_limit: Decimal,
) -> anyhow::Result<Customer> {
    let customer = repo
        .create(NewCustomer {
            name: name.to_string(),
            credit_limit,
            ..NewCustomer::default()
        })
        .await?;
    println!("  {} (limit {})", customer.name, customer.credit_limit);
    Ok(customer)
}

fn sale(
    customer_id: CustomerId,
    sale_date: NaiveDate,
    items: Vec<SaleLineInput>,
    payments: Vec<PaymentInput>,
) -> CreateSaleInput {
    CreateSaleInput {
        customer_id,
        sale_date: Some(sale_date),
        items,
        payments,
        notes: None,
    }
}

fn line(product_id: ProductId, quantity: i32) -> SaleLineInput {
    SaleLineInput {
        product_id,
        quantity,
    }
}

fn pay(method_id: PaymentMethodId, amount: Decimal) -> PaymentInput {
    PaymentInput {
        method_id,
        amount,
        check: None,
    }
}

fn check_details(number: &str, issue_date: NaiveDate, due_date: Option<NaiveDate>) -> CheckDetails {
    CheckDetails {
        number: number.to_string(),
        bank: "Banco Provincia".to_string(),
        issue_date,
        due_date,
        notes: None,
    }
}
