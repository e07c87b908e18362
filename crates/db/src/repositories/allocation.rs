//! Customer account payments, FIFO allocation, and manual adjustments.
//!
//! An account payment is applied to the customer's sales oldest debt first;
//! whatever exceeds all outstanding debt becomes one unlinked credit reported
//! as surplus. Adjustments correct the account with an offsetting entry,
//! never by touching an existing one.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use cuentas_core::LedgerContext;
use cuentas_core::LedgerError;
use cuentas_core::checks::{Check, CheckDetails, CheckParty, NewCheck};
use cuentas_core::ledger::{
    AllocationOutcome, BalanceCalculator, EntryKind, LedgerEntry, NewLedgerEntry,
    PaymentAllocator,
};
use cuentas_core::payment_method::PaymentMethodKind;
use cuentas_shared::types::{
    CustomerId, LedgerEntryId, PaymentMethodId, SaleId, UserId, exceeds_with_tolerance,
    round_money,
};

use crate::error::DbResultExt;
use crate::locking::{self, CustomerGuard};

use super::check::insert_check;
use super::ledger::{EntryFilter, LedgerRepository};
use super::sale::{find_sale, sync_sale_status};

/// Input for a payment on the customer's account.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerPaymentInput {
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date, today when omitted.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Payment method; treated as a direct payment when omitted.
    #[serde(default)]
    pub method_id: Option<PaymentMethodId>,
    /// Required for check methods.
    #[serde(default)]
    pub check: Option<CheckDetails>,
    /// Description for the ledger entries.
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for a manual correction of a customer's account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustmentInput {
    /// Signed amount: positive debits the account, negative credits it.
    pub amount: Decimal,
    /// Sale the correction belongs to, if any.
    #[serde(default)]
    pub sale_id: Option<SaleId>,
    /// Business date, today when omitted.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    /// Why the account is corrected. Required.
    pub description: String,
}

/// Result of an adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentRecorded {
    /// The appended entry.
    pub entry: LedgerEntry,
    /// Customer balance after the adjustment.
    pub balance_after: Decimal,
}

/// Result of an account payment.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountPaymentResult {
    /// The amount was allocated to the ledger.
    Allocated(AllocationOutcome),
    /// A pending check was recorded; it is allocated when it clears.
    CheckPending(Check),
}

/// Allocation repository.
#[derive(Debug, Clone)]
pub struct AllocationRepository {
    db: DatabaseConnection,
    ctx: LedgerContext,
}

impl AllocationRepository {
    /// Creates a new allocation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, ctx: LedgerContext) -> Self {
        Self { db, ctx }
    }

    /// Applies a payment to the customer's outstanding sales, oldest first.
    ///
    /// A check method records a pending check with no sale and allocates
    /// nothing until the check clears. The running-account method is not a
    /// way of paying and is rejected. Allocation is not idempotent: calling
    /// twice pays twice.
    ///
    /// # Errors
    ///
    /// Returns a validation, not-found, `Busy`, or storage error.
    pub async fn allocate_customer_payment(
        &self,
        customer_id: CustomerId,
        input: CustomerPaymentInput,
        actor: Option<UserId>,
    ) -> Result<AccountPaymentResult, LedgerError> {
        let amount = round_money(input.amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::validation("amount", "amount must be positive"));
        }
        let payment_date = input.payment_date.unwrap_or_else(|| Utc::now().date_naive());

        let kind = match input.method_id {
            Some(method_id) => Some(self.ctx.registry.resolve(method_id)?.kind),
            None => None,
        };
        match (kind, &input.check) {
            (Some(PaymentMethodKind::RunningAccount), _) => {
                return Err(LedgerError::validation(
                    "method_id",
                    "the running account cannot pay itself",
                ));
            }
            (Some(PaymentMethodKind::Check), None) => {
                return Err(LedgerError::validation(
                    "check",
                    "check details are required for check payments",
                ));
            }
            (Some(PaymentMethodKind::Check), Some(_)) => {}
            (_, Some(_)) => {
                return Err(LedgerError::validation(
                    "check",
                    "check details are only accepted for check payments",
                ));
            }
            _ => {}
        }

        let txn = locking::begin(&self.db, &self.ctx).await?;
        let mut guard = locking::lock_customer(&txn, customer_id).await?;

        if let Some(details) = input.check {
            let new_check = NewCheck::new(
                details,
                amount,
                CheckParty::Received {
                    customer_id,
                    sale_id: None,
                },
            )?;
            let model = insert_check(&txn, new_check, actor).await?;
            let check = Check::try_from(model)?;
            txn.commit().await.map_db()?;

            tracing::info!(
                customer_id = %customer_id,
                check_id = %check.id,
                amount = %amount,
                "account payment by check recorded as pending"
            );
            return Ok(AccountPaymentResult::CheckPending(check));
        }

        let description = input
            .description
            .unwrap_or_else(|| "Payment on account".to_string());
        let outcome = apply_allocation(&mut guard, amount, payment_date, &description, actor).await?;
        txn.commit().await.map_db()?;

        tracing::info!(
            customer_id = %customer_id,
            amount = %amount,
            sales = outcome.sales_affected.len(),
            surplus = %outcome.surplus,
            balance_after = %outcome.balance_after,
            "account payment allocated"
        );
        Ok(AccountPaymentResult::Allocated(outcome))
    }

    /// Appends a manual `adjustment` entry to the customer's account.
    ///
    /// A sale-linked credit may not exceed the sale's live debt; unlinked
    /// credits beyond the balance become surplus. Debits are corrections of
    /// past entries and are not checked against the credit limit.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero amount, a blank description, a
    /// sale of another customer, or a credit above the sale's debt;
    /// `CustomerNotFound`, `SaleNotFound`, `Busy`, or a storage error.
    pub async fn record_adjustment(
        &self,
        customer_id: CustomerId,
        input: AdjustmentInput,
        actor: Option<UserId>,
    ) -> Result<AdjustmentRecorded, LedgerError> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(LedgerError::validation(
                "description",
                "an adjustment needs a description",
            ));
        }
        let entry_date = input.entry_date.unwrap_or_else(|| Utc::now().date_naive());
        let entry = NewLedgerEntry::new(
            customer_id,
            EntryKind::Adjustment,
            input.amount,
            input.sale_id,
            entry_date,
        )?
        .with_description(description)
        .recorded_by(actor);

        let txn = locking::begin(&self.db, &self.ctx).await?;
        let mut guard = locking::lock_customer(&txn, customer_id).await?;

        if let Some(sale_id) = input.sale_id {
            let sale = find_sale(&txn, sale_id).await?;
            if sale.customer_id != customer_id.into_inner() {
                return Err(LedgerError::validation(
                    "sale_id",
                    "sale belongs to another customer",
                ));
            }
            let live_debt = LedgerRepository::sale_totals(&txn, sale_id).await?.balance();
            if exceeds_with_tolerance(entry.credit, live_debt) {
                return Err(LedgerError::validation(
                    "amount",
                    format!("credit exceeds the sale's remaining debt of {live_debt}"),
                ));
            }
        }

        let entry = LedgerRepository::record(&guard, entry).await?;
        let balance_after = LedgerRepository::refresh_customer_balance(&mut guard).await?;
        if let Some(sale_id) = entry.sale_id {
            sync_sale_status(&txn, sale_id).await?;
        }
        txn.commit().await.map_db()?;

        tracing::info!(
            customer_id = %customer_id,
            sale_id = ?entry.sale_id,
            amount = %entry.signed_amount(),
            balance_after = %balance_after,
            "account adjusted"
        );
        Ok(AdjustmentRecorded {
            entry,
            balance_after,
        })
    }
}

/// Allocates `amount` FIFO over the locked customer's outstanding sales.
///
/// Reads the ledger after the lock, posts one credit per sale reached plus an
/// unlinked surplus credit when money remains, refreshes the cached balance,
/// and re-derives the status of every affected sale.
pub(crate) async fn apply_allocation(
    guard: &mut CustomerGuard<'_>,
    amount: Decimal,
    date: NaiveDate,
    description: &str,
    actor: Option<UserId>,
) -> Result<AllocationOutcome, LedgerError> {
    let customer_id = guard.customer_id();
    let entries =
        LedgerRepository::entries_for(guard.txn(), customer_id, &EntryFilter::default()).await?;
    let debts = BalanceCalculator::outstanding_by_sale(&entries);
    let plan = PaymentAllocator::allocate(amount, &debts)?;

    let mut entries_created = Vec::with_capacity(plan.allocations.len() + 1);
    let mut sales_affected = Vec::with_capacity(plan.allocations.len());
    for allocation in &plan.allocations {
        let entry = NewLedgerEntry::payment(customer_id, Some(allocation.sale_id), allocation.amount, date)?
            .with_description(description)
            .recorded_by(actor);
        entries_created.push(LedgerRepository::record(guard, entry).await?);
        sales_affected.push(allocation.sale_id);
    }

    let mut surplus_entry_id: Option<LedgerEntryId> = None;
    if plan.surplus > Decimal::ZERO {
        let entry = NewLedgerEntry::payment(customer_id, None, plan.surplus, date)?
            .with_description(format!("{description} (surplus)"))
            .recorded_by(actor);
        let recorded = LedgerRepository::record(guard, entry).await?;
        surplus_entry_id = Some(recorded.id);
        entries_created.push(recorded);
        tracing::warn!(
            customer_id = %customer_id,
            amount = %amount,
            surplus = %plan.surplus,
            "payment exceeds outstanding debt, surplus credited to account"
        );
    }

    let balance_after = LedgerRepository::refresh_customer_balance(guard).await?;
    for sale_id in &sales_affected {
        sync_sale_status(guard.txn(), *sale_id).await?;
    }

    Ok(AllocationOutcome {
        entries_created,
        sales_affected,
        surplus: plan.surplus,
        surplus_entry_id,
        balance_after,
    })
}
