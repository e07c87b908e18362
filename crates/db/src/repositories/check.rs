//! Check repository: postdated checks received from customers or issued to
//! suppliers.
//!
//! Transitions are decided by [`CheckLifecycle`]; this module applies them
//! under row locks. For received checks every transition and edit locks the
//! customer before the check. Clearing a received check credits the customer's ledger; bouncing
//! and voiding leave the ledger untouched.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cuentas_core::LedgerContext;
use cuentas_core::LedgerError;
use cuentas_core::checks::{
    Check, CheckAdminUpdate, CheckAlert, CheckDetails, CheckDirection, CheckLifecycle, CheckParty,
    CheckState, CheckTransition, NewCheck, pending_with_alerts,
};
use cuentas_core::ledger::{AllocationOutcome, LedgerEntry, NewLedgerEntry};
use cuentas_shared::types::{CheckId, CustomerId, SaleId, SupplierId, UserId};

use crate::entities::{checks, sea_orm_active_enums, suppliers};
use crate::error::DbResultExt;
use crate::locking::{self, CustomerGuard};

use super::allocation::apply_allocation;
use super::ledger::LedgerRepository;
use super::sale::sync_sale_status;

/// Filter for listing checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckFilter {
    /// Only checks in this state.
    pub state: Option<CheckState>,
    /// Only received or issued checks.
    pub direction: Option<CheckDirection>,
    /// Only checks from this customer.
    pub customer_id: Option<CustomerId>,
    /// Only checks linked to this sale.
    pub sale_id: Option<SaleId>,
    /// Only checks issued to this supplier.
    pub supplier_id: Option<SupplierId>,
}

/// Input for issuing a check to a supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueSupplierCheckInput {
    /// Payee.
    pub supplier_id: SupplierId,
    /// Face amount.
    pub amount: Decimal,
    /// Number, bank, and dates.
    #[serde(flatten)]
    pub details: CheckDetails,
}

/// Ledger effect of clearing a check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ClearingEffect {
    /// Issued checks never touch a customer ledger.
    Untouched,
    /// Credit posted against the linked sale, with any excess as surplus.
    SaleCredit {
        /// Entries created.
        entries: Vec<LedgerEntry>,
        /// Part of the amount not absorbed by the sale's debt.
        surplus: Decimal,
        /// Customer balance after clearing.
        balance_after: Decimal,
    },
    /// Amount allocated FIFO across the customer's outstanding sales.
    Allocated(AllocationOutcome),
}

/// Result of clearing a check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckCleared {
    /// The check after the transition.
    pub check: Check,
    /// What clearing did to the ledger.
    pub effect: ClearingEffect,
}

impl TryFrom<checks::Model> for Check {
    type Error = LedgerError;

    fn try_from(model: checks::Model) -> Result<Self, Self::Error> {
        let party = match (model.direction, model.customer_id, model.supplier_id) {
            (sea_orm_active_enums::CheckDirection::Received, Some(customer_id), _) => {
                CheckParty::Received {
                    customer_id: CustomerId::from_uuid(customer_id),
                    sale_id: model.sale_id.map(SaleId::from_uuid),
                }
            }
            (sea_orm_active_enums::CheckDirection::Issued, _, Some(supplier_id)) => {
                CheckParty::Issued {
                    supplier_id: SupplierId::from_uuid(supplier_id),
                }
            }
            _ => {
                return Err(LedgerError::Internal(format!(
                    "check {} has no party for its direction",
                    model.id
                )));
            }
        };

        Ok(Self {
            id: CheckId::from_uuid(model.id),
            number: model.number,
            bank: model.bank,
            amount: model.amount,
            issue_date: model.issue_date,
            due_date: model.due_date,
            state: model.state.into(),
            party,
            cleared_on: model.cleared_on,
            state_reason: model.state_reason,
            notes: model.notes,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

/// Inserts a pending check.
pub(crate) async fn insert_check<C: ConnectionTrait>(
    conn: &C,
    check: NewCheck,
    actor: Option<UserId>,
) -> Result<checks::Model, LedgerError> {
    let (direction, customer_id, sale_id, supplier_id) = match check.party {
        CheckParty::Received {
            customer_id,
            sale_id,
        } => (
            sea_orm_active_enums::CheckDirection::Received,
            Some(customer_id.into_inner()),
            sale_id.map(SaleId::into_inner),
            None,
        ),
        CheckParty::Issued { supplier_id } => (
            sea_orm_active_enums::CheckDirection::Issued,
            None,
            None,
            Some(supplier_id.into_inner()),
        ),
    };

    checks::ActiveModel {
        id: Set(Uuid::now_v7()),
        direction: Set(direction),
        customer_id: Set(customer_id),
        sale_id: Set(sale_id),
        supplier_id: Set(supplier_id),
        number: Set(check.details.number.trim().to_string()),
        bank: Set(check.details.bank.trim().to_string()),
        amount: Set(check.amount),
        issue_date: Set(check.details.issue_date),
        due_date: Set(check.details.due_date),
        state: Set(sea_orm_active_enums::CheckState::Pending),
        cleared_on: Set(None),
        state_reason: Set(None),
        notes: Set(check.details.notes),
        created_by: Set(actor.map(UserId::into_inner)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await
    .map_db()
}

/// Check repository.
#[derive(Debug, Clone)]
pub struct CheckRepository {
    db: DatabaseConnection,
    ctx: LedgerContext,
}

impl CheckRepository {
    /// Creates a new check repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, ctx: LedgerContext) -> Self {
        Self { db, ctx }
    }

    /// Fetches a check.
    ///
    /// # Errors
    ///
    /// Returns `CheckNotFound` or a storage error.
    pub async fn get(&self, check_id: CheckId) -> Result<Check, LedgerError> {
        self.find(check_id).await.and_then(Check::try_from)
    }

    /// Lists checks ordered by due date, undated last.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, filter: &CheckFilter) -> Result<Vec<Check>, LedgerError> {
        let mut query = checks::Entity::find();
        if let Some(state) = filter.state {
            let state: sea_orm_active_enums::CheckState = state.into();
            query = query.filter(checks::Column::State.eq(state));
        }
        if let Some(direction) = filter.direction {
            let direction: sea_orm_active_enums::CheckDirection = direction.into();
            query = query.filter(checks::Column::Direction.eq(direction));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(checks::Column::CustomerId.eq(customer_id.into_inner()));
        }
        if let Some(sale_id) = filter.sale_id {
            query = query.filter(checks::Column::SaleId.eq(sale_id.into_inner()));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(checks::Column::SupplierId.eq(supplier_id.into_inner()));
        }

        let mut list: Vec<Check> = query
            .order_by_asc(checks::Column::DueDate)
            .order_by_asc(checks::Column::IssueDate)
            .all(&self.db)
            .await
            .map_db()?
            .into_iter()
            .map(Check::try_from)
            .collect::<Result<_, _>>()?;
        list.sort_by_key(|check| (check.due_date.is_none(), check.due_date));
        Ok(list)
    }

    /// Marks a pending check as cleared.
    ///
    /// For a received check linked to a sale, a `payment` credit is posted
    /// against the sale, capped at the sale's live ledger debt; any excess is
    /// posted unlinked and logged. A received check without a sale is
    /// allocated FIFO over the customer's outstanding sales. Issued checks
    /// only change state.
    ///
    /// # Errors
    ///
    /// Returns `CheckNotFound`, `InvalidStateTransition`, `Busy`, or a storage
    /// error.
    pub async fn mark_cleared(
        &self,
        check_id: CheckId,
        cleared_on: Option<NaiveDate>,
        actor: Option<UserId>,
    ) -> Result<CheckCleared, LedgerError> {
        let cleared_on = cleared_on.unwrap_or_else(|| Utc::now().date_naive());
        let snapshot = self.find(check_id).await?;

        let txn = locking::begin(&self.db, &self.ctx).await?;
        let Some(customer_uuid) = snapshot.customer_id else {
            // Issued check: no customer to lock.
            let model = locking::lock_check(&txn, check_id).await?;
            let transition = CheckLifecycle::clear(model.state.into(), cleared_on)?;
            let check = apply_transition(&txn, model, &transition).await?;
            txn.commit().await.map_db()?;
            tracing::info!(check_id = %check_id, amount = %check.amount, "issued check cleared");
            return Ok(CheckCleared {
                check,
                effect: ClearingEffect::Untouched,
            });
        };

        let customer_id = CustomerId::from_uuid(customer_uuid);
        let mut guard = locking::lock_customer(&txn, customer_id).await?;
        let model = locking::lock_check(&txn, check_id).await?;
        let transition = CheckLifecycle::clear(model.state.into(), cleared_on)?;
        let check = apply_transition(&txn, model, &transition).await?;

        let description = format!("Check {} ({}) cleared", check.number, check.bank);
        let effect = match check.party.sale_id() {
            Some(sale_id) => {
                credit_sale(&mut guard, sale_id, check.amount, cleared_on, &description, actor)
                    .await?
            }
            None => ClearingEffect::Allocated(
                apply_allocation(&mut guard, check.amount, cleared_on, &description, actor).await?,
            ),
        };
        txn.commit().await.map_db()?;

        tracing::info!(
            check_id = %check_id,
            customer_id = %customer_id,
            sale_id = ?check.party.sale_id(),
            amount = %check.amount,
            "received check cleared"
        );
        Ok(CheckCleared { check, effect })
    }

    /// Marks a pending check as bounced. The ledger is left untouched, so the
    /// debt the check stood for remains owed.
    ///
    /// # Errors
    ///
    /// Returns `CheckNotFound`, `InvalidStateTransition`, `Busy`, or a storage
    /// error.
    pub async fn mark_bounced(
        &self,
        check_id: CheckId,
        reason: Option<String>,
    ) -> Result<Check, LedgerError> {
        let snapshot = self.find(check_id).await?;
        let txn = locking::begin(&self.db, &self.ctx).await?;
        let (_owner, model) = lock_in_order(&txn, &snapshot, check_id).await?;
        let transition = CheckLifecycle::bounce(model.state.into(), reason)?;
        let check = apply_transition(&txn, model, &transition).await?;
        txn.commit().await.map_db()?;

        tracing::warn!(
            check_id = %check_id,
            amount = %check.amount,
            reason = ?check.state_reason,
            "check bounced"
        );
        Ok(check)
    }

    /// Voids a pending check administratively. The ledger is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty reason, `CheckNotFound`,
    /// `InvalidStateTransition`, `Busy`, or a storage error.
    pub async fn mark_voided(&self, check_id: CheckId, reason: String) -> Result<Check, LedgerError> {
        let snapshot = self.find(check_id).await?;
        let txn = locking::begin(&self.db, &self.ctx).await?;
        let (_owner, model) = lock_in_order(&txn, &snapshot, check_id).await?;
        let transition = CheckLifecycle::void(model.state.into(), reason)?;
        let check = apply_transition(&txn, model, &transition).await?;
        txn.commit().await.map_db()?;

        tracing::info!(check_id = %check_id, reason = ?check.state_reason, "check voided");
        Ok(check)
    }

    /// Edits number, bank, due date, or notes of a pending check.
    ///
    /// # Errors
    ///
    /// Returns `CheckNotEditable` for terminal checks, a validation error,
    /// `CheckNotFound`, `Busy`, or a storage error.
    pub async fn update_admin_fields(
        &self,
        check_id: CheckId,
        update: CheckAdminUpdate,
    ) -> Result<Check, LedgerError> {
        let snapshot = self.find(check_id).await?;
        let txn = locking::begin(&self.db, &self.ctx).await?;
        let (_owner, model) = lock_in_order(&txn, &snapshot, check_id).await?;
        CheckLifecycle::ensure_editable(model.state.into(), &update)?;

        if let Some(due) = update.due_date
            && due < model.issue_date
        {
            return Err(LedgerError::validation(
                "due_date",
                "due date cannot precede the issue date",
            ));
        }

        let mut active: checks::ActiveModel = model.into();
        if let Some(number) = update.number {
            active.number = Set(number.trim().to_string());
        }
        if let Some(bank) = update.bank {
            active.bank = Set(bank.trim().to_string());
        }
        if let Some(due) = update.due_date {
            active.due_date = Set(Some(due));
        }
        if let Some(notes) = update.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await.map_db()?;
        txn.commit().await.map_db()?;
        Check::try_from(updated)
    }

    /// Pending checks of both directions with due-date alerts.
    ///
    /// `warning_days` defaults to the configured value.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn pending_with_alerts(
        &self,
        today: NaiveDate,
        warning_days: Option<u32>,
    ) -> Result<Vec<CheckAlert>, LedgerError> {
        let filter = CheckFilter {
            state: Some(CheckState::Pending),
            ..CheckFilter::default()
        };
        let pending = self.list(&filter).await?;
        Ok(pending_with_alerts(
            pending,
            today,
            warning_days.unwrap_or(self.ctx.check_warning_days),
        ))
    }

    /// Issues a pending check to a supplier.
    ///
    /// # Errors
    ///
    /// Returns `SupplierNotFound`, a validation error, or a storage error.
    pub async fn issue_supplier_check(
        &self,
        input: IssueSupplierCheckInput,
        actor: Option<UserId>,
    ) -> Result<Check, LedgerError> {
        suppliers::Entity::find_by_id(input.supplier_id.into_inner())
            .one(&self.db)
            .await
            .map_db()?
            .ok_or(LedgerError::SupplierNotFound(input.supplier_id))?;

        let new_check = NewCheck::new(
            input.details,
            input.amount,
            CheckParty::Issued {
                supplier_id: input.supplier_id,
            },
        )?;
        let model = insert_check(&self.db, new_check, actor).await?;

        tracing::info!(
            check_id = %model.id,
            supplier_id = %input.supplier_id,
            amount = %model.amount,
            "supplier check issued"
        );
        Check::try_from(model)
    }

    async fn find(&self, check_id: CheckId) -> Result<checks::Model, LedgerError> {
        checks::Entity::find_by_id(check_id.into_inner())
            .one(&self.db)
            .await
            .map_db()?
            .ok_or(LedgerError::CheckNotFound(check_id))
    }
}

/// Locks the customer of a received check, then the check itself.
///
/// The owner never changes after creation, so the unlocked `snapshot` is
/// enough to pick the customer.
async fn lock_in_order<'t>(
    txn: &'t DatabaseTransaction,
    snapshot: &checks::Model,
    check_id: CheckId,
) -> Result<(Option<CustomerGuard<'t>>, checks::Model), LedgerError> {
    let owner = match snapshot.customer_id {
        Some(customer_uuid) => {
            Some(locking::lock_customer(txn, CustomerId::from_uuid(customer_uuid)).await?)
        }
        None => None,
    };
    let model = locking::lock_check(txn, check_id).await?;
    Ok((owner, model))
}

/// Persists a decided transition on a locked check row.
async fn apply_transition(
    txn: &DatabaseTransaction,
    model: checks::Model,
    transition: &CheckTransition,
) -> Result<Check, LedgerError> {
    let mut active: checks::ActiveModel = model.into();
    active.state = Set(transition.new_state().into());
    match transition {
        CheckTransition::Clear { cleared_on, .. } => {
            active.cleared_on = Set(Some(*cleared_on));
        }
        CheckTransition::Bounce { reason, .. } => {
            active.state_reason = Set(reason.clone());
        }
        CheckTransition::Void { reason, .. } => {
            active.state_reason = Set(Some(reason.clone()));
        }
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(txn).await.map_db()?;
    Check::try_from(updated)
}

/// Credits a cleared check against its sale, sending any excess to surplus.
async fn credit_sale(
    guard: &mut CustomerGuard<'_>,
    sale_id: SaleId,
    amount: Decimal,
    cleared_on: NaiveDate,
    description: &str,
    actor: Option<UserId>,
) -> Result<ClearingEffect, LedgerError> {
    let customer_id = guard.customer_id();
    let live_debt = LedgerRepository::sale_totals(guard.txn(), sale_id)
        .await?
        .balance();
    let applied = amount.min(live_debt);
    let surplus = amount - applied;

    let mut entries = Vec::new();
    if applied > Decimal::ZERO {
        let entry = NewLedgerEntry::payment(customer_id, Some(sale_id), applied, cleared_on)?
            .with_description(description)
            .recorded_by(actor);
        entries.push(LedgerRepository::record(guard, entry).await?);
    }
    if surplus > Decimal::ZERO {
        let entry = NewLedgerEntry::payment(customer_id, None, surplus, cleared_on)?
            .with_description(format!("{description}, excess over sale {sale_id}"))
            .recorded_by(actor);
        entries.push(LedgerRepository::record(guard, entry).await?);
        tracing::warn!(
            customer_id = %customer_id,
            sale_id = %sale_id,
            surplus = %surplus,
            "cleared check exceeds the sale's remaining debt, excess kept as surplus"
        );
    }

    let balance_after = LedgerRepository::refresh_customer_balance(guard).await?;
    sync_sale_status(guard.txn(), sale_id).await?;

    Ok(ClearingEffect::SaleCredit {
        entries,
        surplus,
        balance_after,
    })
}
