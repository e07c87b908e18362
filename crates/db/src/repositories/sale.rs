//! Sale repository: creation, later payments, and reconciliation.
//!
//! A sale's total is fixed from catalog prices when it is created. Payments
//! made with running-account or check methods become the sale's single
//! `sale_debt` ledger entry; every other method counts as collected. The
//! persisted `payment_status` is re-derived from [`SaleReconciler`] after each
//! mutation touching the sale.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cuentas_core::LedgerContext;
use cuentas_core::LedgerError;
use cuentas_core::catalog::Product;
use cuentas_core::checks::{Check, CheckDetails, CheckParty, NewCheck};
use cuentas_core::ledger::{
    BalanceCalculator, CreditLimitGuard, EntryKind, LedgerEntry, NewLedgerEntry,
};
use cuentas_core::sales::{
    Payment, PaymentInput, PaymentPosting, PaymentStatus, PlannedPayment, Sale, SaleLine,
    SaleLineInput, SalePaymentPlan, SaleReconciler, SaleReconciliation, price_lines,
};
use cuentas_shared::types::{
    CheckId, CustomerId, PaymentId, PaymentMethodId, ProductId, SaleId, UserId,
};

use crate::entities::{checks, payments, products, sale_items, sales, sea_orm_active_enums};
use crate::error::DbResultExt;
use crate::locking::{self, CustomerGuard};

use super::check::insert_check;
use super::ledger::LedgerRepository;

/// Input for creating a sale.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleInput {
    /// Buying customer.
    pub customer_id: CustomerId,
    /// Sale date, today when omitted.
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    /// Line items priced from the catalog.
    pub items: Vec<SaleLineInput>,
    /// Payments offered at creation.
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for recording a payment on an existing sale.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentInput {
    /// Payment method.
    pub method_id: PaymentMethodId,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date, today when omitted.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Required for check methods.
    #[serde(default)]
    pub check: Option<CheckDetails>,
}

/// Filter for listing sales.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleFilter {
    /// Only sales of this customer.
    pub customer_id: Option<CustomerId>,
    /// Only sales in this payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Inclusive lower date bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub date_to: Option<NaiveDate>,
}

/// A sale with its lines, payments, checks, and reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    /// Sale header.
    #[serde(flatten)]
    pub sale: Sale,
    /// Priced line items.
    pub lines: Vec<SaleLine>,
    /// Payments in recording order.
    pub payments: Vec<Payment>,
    /// Checks received for the sale.
    pub checks: Vec<Check>,
    /// Owed-versus-collected view.
    pub reconciliation: SaleReconciliation,
}

/// Result of recording a payment on a sale.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecorded {
    /// The stored payment.
    pub payment: Payment,
    /// Check spawned by a check-method payment.
    pub check: Option<Check>,
    /// Ledger entry posted by the payment, if any.
    pub ledger_entry: Option<LedgerEntry>,
    /// Reconciliation after the payment.
    pub reconciliation: SaleReconciliation,
}

impl From<sales::Model> for Sale {
    fn from(model: sales::Model) -> Self {
        Self {
            id: SaleId::from_uuid(model.id),
            customer_id: CustomerId::from_uuid(model.customer_id),
            sale_date: model.sale_date,
            total: model.total,
            payment_status: model.payment_status.into(),
            notes: model.notes,
            created_by: model.created_by.map(UserId::from_uuid),
            created_at: model.created_at.into(),
        }
    }
}

impl From<sale_items::Model> for SaleLine {
    fn from(model: sale_items::Model) -> Self {
        Self {
            product_id: ProductId::from_uuid(model.product_id),
            description: model.description,
            quantity: model.quantity,
            unit_price: model.unit_price,
            line_total: model.line_total,
        }
    }
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: PaymentId::from_uuid(model.id),
            sale_id: SaleId::from_uuid(model.sale_id),
            method_id: PaymentMethodId::from_uuid(model.method_id),
            method_kind: model.method_kind.into(),
            amount: model.amount,
            payment_date: model.payment_date,
            check_id: model.check_id.map(CheckId::from_uuid),
            recorded_by: model.recorded_by.map(UserId::from_uuid),
            created_at: model.created_at.into(),
        }
    }
}

/// Sale repository.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: DatabaseConnection,
    ctx: LedgerContext,
}

impl SaleRepository {
    /// Creates a new sale repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, ctx: LedgerContext) -> Self {
        Self { db, ctx }
    }

    /// Creates a sale, its payments and checks, and registers its debt.
    ///
    /// Runs as one transaction under the customer lock:
    /// 1. Price the lines from locked product rows and decrement stock
    /// 2. Build the payment plan (overpayment is rejected)
    /// 3. Check running-account plus check debt against the credit limit
    /// 4. Store sale, lines, checks, and payments
    /// 5. Record the `sale_debt` entry and refresh the cached balance
    ///
    /// # Errors
    ///
    /// Returns a validation, stock, credit, overpayment, not-found, `Busy`,
    /// or storage error. Nothing is persisted on error.
    pub async fn create_sale(
        &self,
        input: CreateSaleInput,
        actor: Option<UserId>,
    ) -> Result<SaleDetail, LedgerError> {
        let CreateSaleInput {
            customer_id,
            sale_date,
            items,
            payments,
            notes,
        } = input;
        let sale_date = sale_date.unwrap_or_else(|| Utc::now().date_naive());

        let txn = locking::begin(&self.db, &self.ctx).await?;
        let mut guard = locking::lock_customer(&txn, customer_id).await?;
        if !guard.customer().active {
            return Err(LedgerError::validation("customer_id", "customer is inactive"));
        }

        let product_ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let locked_products = locking::lock_products(&txn, &product_ids).await?;
        let catalog: Vec<Product> = locked_products.iter().cloned().map(Product::from).collect();
        let priced = price_lines(&items, &catalog)?;

        let plan = SalePaymentPlan::build(priced.total, payments, &self.ctx.registry)?;
        let debt = plan.debt_to_register();
        if debt > Decimal::ZERO {
            ensure_credit(&guard, debt).await?;
        }

        // Insert sale header
        let sale_id = SaleId::new();
        sales::ActiveModel {
            id: Set(sale_id.into_inner()),
            customer_id: Set(customer_id.into_inner()),
            sale_date: Set(sale_date),
            total: Set(priced.total),
            payment_status: Set(sea_orm_active_enums::PaymentStatus::Pending),
            notes: Set(notes),
            created_by: Set(actor.map(UserId::into_inner)),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await
        .map_db()?;

        // Insert lines
        for line in &priced.lines {
            sale_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                sale_id: Set(sale_id.into_inner()),
                product_id: Set(line.product_id.into_inner()),
                description: Set(line.description.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total),
            }
            .insert(&txn)
            .await
            .map_db()?;
        }

        // Decrement stock
        let now = Utc::now();
        for product in locked_products {
            let Some(quantity) = priced.stock_out.get(&ProductId::from_uuid(product.id)) else {
                continue;
            };
            let remaining = product.stock - quantity;
            let mut active: products::ActiveModel = product.into();
            active.stock = Set(remaining);
            active.updated_at = Set(now.into());
            active.update(&txn).await.map_db()?;
        }

        // Checks and payments
        for planned in &plan.payments {
            let check_id = match &planned.check {
                Some(details) => {
                    let new_check = NewCheck::new(
                        details.clone(),
                        planned.amount,
                        CheckParty::Received {
                            customer_id,
                            sale_id: Some(sale_id),
                        },
                    )?;
                    Some(insert_check(&txn, new_check, actor).await?.id)
                }
                None => None,
            };
            insert_payment(&txn, sale_id, planned, sale_date, check_id, actor).await?;
        }

        // Register debt
        if debt > Decimal::ZERO {
            let entry = NewLedgerEntry::sale_debt(customer_id, sale_id, debt, sale_date)?
                .with_description(format!("Sale {sale_id}"))
                .recorded_by(actor);
            LedgerRepository::record(&guard, entry).await?;
            LedgerRepository::refresh_customer_balance(&mut guard).await?;
        }
        let balance_after = guard.customer().current_balance;

        sync_sale_status(&txn, sale_id).await?;
        let detail = detail_in(&txn, sale_id).await?;
        txn.commit().await.map_db()?;

        tracing::info!(
            sale_id = %sale_id,
            customer_id = %customer_id,
            total = %detail.sale.total,
            collected = %plan.direct_collected,
            debt = %debt,
            unassigned = %plan.unassigned,
            balance_after = %balance_after,
            "sale created"
        );
        Ok(detail)
    }

    /// Records a payment against an existing sale.
    ///
    /// Direct methods may pay up to `unassigned + max(0, ledger_debt -
    /// checks_pending)`; the part above `unassigned` is credited to the sale
    /// in the ledger. Running-account and check methods convert the
    /// `unassigned` remainder into the sale's debt and fail when the sale
    /// already has one.
    ///
    /// # Errors
    ///
    /// Returns a validation, overpayment, duplicate-debt, credit, not-found,
    /// `Busy`, or storage error.
    pub async fn record_payment(
        &self,
        sale_id: SaleId,
        input: RecordPaymentInput,
        actor: Option<UserId>,
    ) -> Result<PaymentRecorded, LedgerError> {
        let customer_id = self.sale_customer(sale_id).await?;
        let payment_date = input.payment_date.unwrap_or_else(|| Utc::now().date_naive());
        let planned = PlannedPayment::resolve(
            PaymentInput {
                method_id: input.method_id,
                amount: input.amount,
                check: input.check,
            },
            &self.ctx.registry,
        )?;

        let txn = locking::begin(&self.db, &self.ctx).await?;
        let mut guard = locking::lock_customer(&txn, customer_id).await?;
        let sale = find_sale(&txn, sale_id).await?;
        let before = reconcile_in(&txn, &sale).await?;

        let mut check = None;
        let mut ledger_entry = None;
        let payment = match before.plan_payment(planned.kind, planned.amount)? {
            PaymentPosting::Collected { ledger_credit } => {
                let payment = insert_payment(&txn, sale_id, &planned, payment_date, None, actor).await?;
                if ledger_credit > Decimal::ZERO {
                    let entry =
                        NewLedgerEntry::payment(customer_id, Some(sale_id), ledger_credit, payment_date)?
                            .with_description(format!("Payment on sale {sale_id}"))
                            .recorded_by(actor);
                    ledger_entry = Some(LedgerRepository::record(&guard, entry).await?);
                    LedgerRepository::refresh_customer_balance(&mut guard).await?;
                }
                payment
            }
            PaymentPosting::Debt {
                amount,
                spawns_check,
            } => {
                ensure_credit(&guard, amount).await?;
                let check_id = if spawns_check {
                    let details = planned.check.clone().ok_or_else(|| {
                        LedgerError::validation("check", "check details are required")
                    })?;
                    let new_check = NewCheck::new(
                        details,
                        amount,
                        CheckParty::Received {
                            customer_id,
                            sale_id: Some(sale_id),
                        },
                    )?;
                    let model = insert_check(&txn, new_check, actor).await?;
                    let id = model.id;
                    check = Some(Check::try_from(model)?);
                    Some(id)
                } else {
                    None
                };
                let payment =
                    insert_payment(&txn, sale_id, &planned, payment_date, check_id, actor).await?;
                let entry = NewLedgerEntry::sale_debt(customer_id, sale_id, amount, payment_date)?
                    .with_description(format!("Sale {sale_id}"))
                    .recorded_by(actor);
                ledger_entry = Some(LedgerRepository::record(&guard, entry).await?);
                LedgerRepository::refresh_customer_balance(&mut guard).await?;
                payment
            }
        };
        let balance_after = guard.customer().current_balance;

        let reconciliation = sync_sale_status(&txn, sale_id).await?;
        txn.commit().await.map_db()?;

        tracing::info!(
            sale_id = %sale_id,
            customer_id = %customer_id,
            method = %planned.kind,
            amount = %planned.amount,
            status = %reconciliation.payment_status,
            balance_after = %balance_after,
            "payment recorded"
        );
        Ok(PaymentRecorded {
            payment: payment.into(),
            check,
            ledger_entry,
            reconciliation,
        })
    }

    /// Fetches a sale with lines, payments, checks, and reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `SaleNotFound` or a storage error.
    pub async fn get(&self, sale_id: SaleId) -> Result<SaleDetail, LedgerError> {
        detail_in(&self.db, sale_id).await
    }

    /// Reconciles a sale.
    ///
    /// # Errors
    ///
    /// Returns `SaleNotFound` or a storage error.
    pub async fn reconcile(&self, sale_id: SaleId) -> Result<SaleReconciliation, LedgerError> {
        let sale = find_sale(&self.db, sale_id).await?;
        reconcile_in(&self.db, &sale).await
    }

    /// Lists sales, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>, LedgerError> {
        let mut query = sales::Entity::find();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sales::Column::CustomerId.eq(customer_id.into_inner()));
        }
        if let Some(status) = filter.payment_status {
            let status: sea_orm_active_enums::PaymentStatus = status.into();
            query = query.filter(sales::Column::PaymentStatus.eq(status));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(sales::Column::SaleDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(sales::Column::SaleDate.lte(to));
        }
        let models = query
            .order_by_desc(sales::Column::SaleDate)
            .order_by_desc(sales::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_db()?;
        Ok(models.into_iter().map(Sale::from).collect())
    }

    async fn sale_customer(&self, sale_id: SaleId) -> Result<CustomerId, LedgerError> {
        let sale = find_sale(&self.db, sale_id).await?;
        Ok(CustomerId::from_uuid(sale.customer_id))
    }
}

/// Runs the credit guard against the locked customer's live ledger balance.
async fn ensure_credit(guard: &CustomerGuard<'_>, additional_debt: Decimal) -> Result<(), LedgerError> {
    let totals = LedgerRepository::customer_totals(guard.txn(), guard.customer_id()).await?;
    CreditLimitGuard::ensure_within_limit(
        guard.customer_id(),
        guard.customer().credit_limit,
        totals.balance(),
        additional_debt,
    )
}

async fn insert_payment<C: ConnectionTrait>(
    conn: &C,
    sale_id: SaleId,
    planned: &PlannedPayment,
    payment_date: NaiveDate,
    check_id: Option<Uuid>,
    actor: Option<UserId>,
) -> Result<payments::Model, LedgerError> {
    payments::ActiveModel {
        id: Set(Uuid::now_v7()),
        sale_id: Set(sale_id.into_inner()),
        method_id: Set(planned.method_id.into_inner()),
        method_kind: Set(planned.kind.into()),
        amount: Set(planned.amount),
        payment_date: Set(payment_date),
        check_id: Set(check_id),
        recorded_by: Set(actor.map(UserId::into_inner)),
        created_at: NotSet,
    }
    .insert(conn)
    .await
    .map_db()
}

pub(crate) async fn find_sale<C: ConnectionTrait>(
    conn: &C,
    sale_id: SaleId,
) -> Result<sales::Model, LedgerError> {
    sales::Entity::find_by_id(sale_id.into_inner())
        .one(conn)
        .await
        .map_db()?
        .ok_or(LedgerError::SaleNotFound(sale_id))
}

async fn sale_checks<C: ConnectionTrait>(conn: &C, sale_id: Uuid) -> Result<Vec<Check>, LedgerError> {
    checks::Entity::find()
        .filter(checks::Column::SaleId.eq(sale_id))
        .order_by_asc(checks::Column::CreatedAt)
        .all(conn)
        .await
        .map_db()?
        .into_iter()
        .map(Check::try_from)
        .collect()
}

async fn sale_payments<C: ConnectionTrait>(
    conn: &C,
    sale_id: Uuid,
) -> Result<Vec<Payment>, LedgerError> {
    let models = payments::Entity::find()
        .filter(payments::Column::SaleId.eq(sale_id))
        .order_by_asc(payments::Column::CreatedAt)
        .all(conn)
        .await
        .map_db()?;
    Ok(models.into_iter().map(Payment::from).collect())
}

/// Reconciles a sale from its payments, checks, and ledger entries.
pub(crate) async fn reconcile_in<C: ConnectionTrait>(
    conn: &C,
    sale: &sales::Model,
) -> Result<SaleReconciliation, LedgerError> {
    let sale_id = SaleId::from_uuid(sale.id);
    let payments = sale_payments(conn, sale.id).await?;
    let checks = sale_checks(conn, sale.id).await?;
    let entries = LedgerRepository::entries_for_sale(conn, sale_id).await?;

    let totals = BalanceCalculator::totals(&entries);
    let original_debt = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::SaleDebt)
        .map(|entry| entry.debit)
        .sum();

    Ok(SaleReconciler::reconcile(
        sale_id,
        sale.total,
        &payments,
        &checks,
        totals,
        original_debt,
    ))
}

/// Re-derives and persists a sale's payment status.
pub(crate) async fn sync_sale_status<C: ConnectionTrait>(
    conn: &C,
    sale_id: SaleId,
) -> Result<SaleReconciliation, LedgerError> {
    let sale = find_sale(conn, sale_id).await?;
    let reconciliation = reconcile_in(conn, &sale).await?;

    let status: sea_orm_active_enums::PaymentStatus = reconciliation.payment_status.into();
    if sale.payment_status != status {
        let previous = sale.payment_status;
        let mut active: sales::ActiveModel = sale.into();
        active.payment_status = Set(status);
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_db()?;
        tracing::debug!(
            sale_id = %sale_id,
            from = ?previous,
            to = %reconciliation.payment_status,
            "sale payment status changed"
        );
    }
    Ok(reconciliation)
}

async fn detail_in<C: ConnectionTrait>(conn: &C, sale_id: SaleId) -> Result<SaleDetail, LedgerError> {
    let sale = find_sale(conn, sale_id).await?;
    let lines = sale_items::Entity::find()
        .filter(sale_items::Column::SaleId.eq(sale.id))
        .all(conn)
        .await
        .map_db()?
        .into_iter()
        .map(SaleLine::from)
        .collect();
    let payments = sale_payments(conn, sale.id).await?;
    let checks = sale_checks(conn, sale.id).await?;
    let reconciliation = reconcile_in(conn, &sale).await?;

    Ok(SaleDetail {
        sale: sale.into(),
        lines,
        payments,
        checks,
        reconciliation,
    })
}
