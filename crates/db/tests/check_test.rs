//! Check lifecycle against a real database.

mod common;

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cuentas_core::{LedgerContext, LedgerError};
use cuentas_core::catalog::NewSupplier;
use cuentas_core::checks::{AlertLevel, CheckAdminUpdate, CheckDetails, CheckState};
use cuentas_core::payment_method::PaymentMethodKind;
use cuentas_core::sales::{PaymentInput, PaymentStatus};
use cuentas_db::CheckRepository;
use cuentas_db::locking;
use cuentas_db::repositories::{
    AccountPaymentResult, ClearingEffect, CustomerPaymentInput, IssueSupplierCheckInput,
    RecordPaymentInput, SaleDetail,
};
use cuentas_shared::types::CustomerId;

use common::{Harness, date, harness};

fn details(number: &str) -> CheckDetails {
    CheckDetails {
        number: number.to_string(),
        bank: "Banco Nación".to_string(),
        issue_date: date(2026, 3, 1),
        due_date: Some(date(2026, 4, 1)),
        notes: None,
    }
}

/// Sale of `total` paid entirely by one postdated check.
async fn sale_paid_by_check(h: &Harness, customer: CustomerId, total: Decimal) -> SaleDetail {
    h.sale(
        customer,
        total,
        date(2026, 3, 1),
        vec![PaymentInput {
            method_id: h.method(PaymentMethodKind::Check),
            amount: total,
            check: Some(details("000123")),
        }],
    )
    .await
}

#[tokio::test]
async fn test_check_payment_registers_debt_until_cleared() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = sale_paid_by_check(&h, customer, dec!(500)).await;

    assert_eq!(sale.checks.len(), 1);
    let rec = &sale.reconciliation;
    assert_eq!(rec.collected, Decimal::ZERO);
    assert_eq!(rec.checks_pending, dec!(500));
    assert_eq!(rec.ledger_debt, dec!(500));
    assert_eq!(sale.sale.payment_status, PaymentStatus::Pending);
    assert_eq!(h.ledger().balance_of(customer).await.unwrap().balance, dec!(500));

    let check_id = sale.checks[0].id;
    let cleared = h
        .checks()
        .mark_cleared(check_id, Some(date(2026, 4, 2)), None)
        .await
        .unwrap();
    assert_eq!(cleared.check.state, CheckState::Cleared);
    assert_eq!(cleared.check.cleared_on, Some(date(2026, 4, 2)));
    let ClearingEffect::SaleCredit {
        surplus,
        balance_after,
        ..
    } = cleared.effect
    else {
        panic!("expected a sale credit");
    };
    assert_eq!(surplus, Decimal::ZERO);
    assert_eq!(balance_after, Decimal::ZERO);

    let rec = h.sales().reconcile(sale.sale.id).await.unwrap();
    assert_eq!(rec.collected, dec!(500));
    assert_eq!(rec.checks_cleared, dec!(500));
    assert_eq!(rec.ledger_debt, Decimal::ZERO);
    assert_eq!(rec.payment_status, PaymentStatus::Paid);

    let again = h.checks().mark_cleared(check_id, None, None).await;
    assert!(matches!(
        again,
        Err(LedgerError::InvalidStateTransition {
            from: CheckState::Cleared,
            to: CheckState::Cleared
        })
    ));
    let bounce = h.checks().mark_bounced(check_id, None).await;
    assert!(matches!(bounce, Err(LedgerError::InvalidStateTransition { .. })));
}

#[tokio::test]
async fn test_bounced_check_leaves_debt_owed() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = sale_paid_by_check(&h, customer, dec!(300)).await;
    let before = h.sales().reconcile(sale.sale.id).await.unwrap();

    let bounced = h
        .checks()
        .mark_bounced(sale.checks[0].id, Some("insufficient funds".to_string()))
        .await
        .unwrap();
    assert_eq!(bounced.state, CheckState::Bounced);
    assert_eq!(bounced.state_reason.as_deref(), Some("insufficient funds"));

    let after = h.sales().reconcile(sale.sale.id).await.unwrap();
    assert_eq!(after.outstanding, before.outstanding);
    assert_eq!(after.ledger_debt, dec!(300));
    assert_eq!(after.checks_bounced, dec!(300));
    assert_eq!(h.ledger().balance_of(customer).await.unwrap().balance, dec!(300));

    let edit = h
        .checks()
        .update_admin_fields(
            sale.checks[0].id,
            CheckAdminUpdate {
                notes: Some("called the customer".to_string()),
                ..CheckAdminUpdate::default()
            },
        )
        .await;
    assert!(matches!(edit, Err(LedgerError::CheckNotEditable(CheckState::Bounced))));
}

#[tokio::test]
async fn test_cleared_check_leaves_only_the_unassigned_remainder() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = h
        .sale(
            customer,
            dec!(400),
            date(2026, 3, 1),
            vec![
                h.pay(PaymentMethodKind::Cash, dec!(100)),
                PaymentInput {
                    method_id: h.method(PaymentMethodKind::Check),
                    amount: dec!(250),
                    check: Some(details("B-250")),
                },
            ],
        )
        .await;
    assert_eq!(sale.reconciliation.amount_due, dec!(300));

    h.checks()
        .mark_cleared(sale.checks[0].id, Some(date(2026, 4, 1)), None)
        .await
        .unwrap();

    let rec = h.sales().reconcile(sale.sale.id).await.unwrap();
    assert_eq!(rec.collected, dec!(350));
    assert_eq!(rec.ledger_debt, Decimal::ZERO);
    assert_eq!(rec.amount_due, dec!(50));
    assert_eq!(rec.payable_now(), dec!(50));
    assert_eq!(rec.payment_status, PaymentStatus::Partial);

    let recorded = h
        .sales()
        .record_payment(
            sale.sale.id,
            RecordPaymentInput {
                method_id: h.method(PaymentMethodKind::Cash),
                amount: dec!(50),
                payment_date: Some(date(2026, 4, 2)),
                check: None,
            },
            None,
        )
        .await
        .unwrap();
    assert!(recorded.ledger_entry.is_none());
    assert_eq!(recorded.reconciliation.amount_due, Decimal::ZERO);
    assert_eq!(recorded.reconciliation.payment_status, PaymentStatus::Paid);
    assert_eq!(h.ledger().balance_of(customer).await.unwrap().balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_check_changes_wait_for_the_customer_lock() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = sale_paid_by_check(&h, customer, dec!(300)).await;
    let check_id = sale.checks[0].id;
    let impatient = CheckRepository::new(
        h.db.clone(),
        LedgerContext {
            lock_timeout: Duration::from_millis(200),
            ..h.ctx.clone()
        },
    );

    // Another transaction is mid-way through a ledger mutation for the customer.
    let holder = locking::begin(&h.db, &h.ctx).await.unwrap();
    let held = locking::lock_customer(&holder, customer).await.unwrap();

    let bounce = impatient.mark_bounced(check_id, None).await;
    assert!(matches!(bounce, Err(LedgerError::Busy(_))));
    let void = impatient.mark_voided(check_id, "entered twice".to_string()).await;
    assert!(matches!(void, Err(LedgerError::Busy(_))));
    let edit = impatient
        .update_admin_fields(
            check_id,
            CheckAdminUpdate {
                notes: Some("deposit Monday".to_string()),
                ..CheckAdminUpdate::default()
            },
        )
        .await;
    assert!(matches!(edit, Err(LedgerError::Busy(_))));

    drop(held);
    holder.rollback().await.unwrap();

    let bounced = impatient.mark_bounced(check_id, None).await.unwrap();
    assert_eq!(bounced.state, CheckState::Bounced);
}

#[tokio::test]
async fn test_void_requires_reason() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = sale_paid_by_check(&h, customer, dec!(120)).await;
    let check_id = sale.checks[0].id;

    let blank = h.checks().mark_voided(check_id, "  ".to_string()).await;
    assert!(matches!(blank, Err(LedgerError::Validation { .. })));

    let voided = h
        .checks()
        .mark_voided(check_id, "entered twice".to_string())
        .await
        .unwrap();
    assert_eq!(voided.state, CheckState::Voided);
    assert_eq!(h.ledger().balance_of(customer).await.unwrap().balance, dec!(120));
}

#[tokio::test]
async fn test_clearing_after_settlement_goes_to_surplus() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = sale_paid_by_check(&h, customer, dec!(200)).await;

    // The account is settled by cash while the check is still pending.
    h.allocation()
        .allocate_customer_payment(
            customer,
            CustomerPaymentInput {
                amount: dec!(200),
                payment_date: Some(date(2026, 3, 15)),
                method_id: Some(h.method(PaymentMethodKind::Cash)),
                check: None,
                description: None,
            },
            None,
        )
        .await
        .unwrap();

    let cleared = h
        .checks()
        .mark_cleared(sale.checks[0].id, Some(date(2026, 4, 1)), None)
        .await
        .unwrap();
    let ClearingEffect::SaleCredit { surplus, entries, .. } = cleared.effect else {
        panic!("expected a sale credit");
    };
    assert_eq!(surplus, dec!(200));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sale_id, None);

    let balance = h.ledger().balance_of(customer).await.unwrap();
    assert_eq!(balance.balance, Decimal::ZERO);
    assert_eq!(balance.surplus, dec!(200));
}

#[tokio::test]
async fn test_account_check_allocates_when_cleared() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = h
        .sale(
            customer,
            dec!(400),
            date(2026, 3, 1),
            vec![h.pay(PaymentMethodKind::RunningAccount, dec!(400))],
        )
        .await;

    let result = h
        .allocation()
        .allocate_customer_payment(
            customer,
            CustomerPaymentInput {
                amount: dec!(150),
                payment_date: None,
                method_id: Some(h.method(PaymentMethodKind::Check)),
                check: Some(details("A-77")),
                description: None,
            },
            None,
        )
        .await
        .unwrap();
    let AccountPaymentResult::CheckPending(check) = result else {
        panic!("expected a pending check");
    };
    assert_eq!(check.party.sale_id(), None);
    assert_eq!(h.ledger().balance_of(customer).await.unwrap().balance, dec!(400));

    let cleared = h
        .checks()
        .mark_cleared(check.id, Some(date(2026, 4, 1)), None)
        .await
        .unwrap();
    let ClearingEffect::Allocated(outcome) = cleared.effect else {
        panic!("expected an allocation");
    };
    assert_eq!(outcome.sales_affected, vec![sale.sale.id]);
    assert_eq!(outcome.balance_after, dec!(250));
}

#[tokio::test]
async fn test_supplier_checks_share_lifecycle_and_alerts() {
    let Some(h) = harness().await else { return };
    let supplier = h
        .suppliers()
        .create(NewSupplier {
            name: "Distribuidora Sur".to_string(),
            ..NewSupplier::default()
        })
        .await
        .unwrap();

    let today = date(2026, 5, 1);
    let soon = h
        .checks()
        .issue_supplier_check(
            IssueSupplierCheckInput {
                supplier_id: supplier.id,
                amount: dec!(900),
                details: CheckDetails {
                    due_date: Some(date(2026, 5, 4)),
                    ..details("S-1")
                },
            },
            None,
        )
        .await
        .unwrap();
    let overdue = h
        .checks()
        .issue_supplier_check(
            IssueSupplierCheckInput {
                supplier_id: supplier.id,
                amount: dec!(50),
                details: CheckDetails {
                    issue_date: date(2026, 4, 1),
                    due_date: Some(date(2026, 4, 20)),
                    ..details("S-2")
                },
            },
            None,
        )
        .await
        .unwrap();

    let alerts = h.checks().pending_with_alerts(today, Some(7)).await.unwrap();
    let level = |id| {
        alerts
            .iter()
            .find(|a| a.check.id == id)
            .map(|a| a.alert)
            .expect("pending check listed")
    };
    assert_eq!(level(soon.id), AlertLevel::DueSoon);
    assert_eq!(level(overdue.id), AlertLevel::Overdue);

    let cleared = h
        .checks()
        .mark_cleared(soon.id, Some(today), None)
        .await
        .unwrap();
    assert!(matches!(cleared.effect, ClearingEffect::Untouched));
    let alerts = h.checks().pending_with_alerts(today, None).await.unwrap();
    assert!(alerts.iter().all(|a| a.check.id != soon.id));
}

#[tokio::test]
async fn test_clearing_races_direct_payments_on_the_same_sale() {
    let Some(h) = harness().await else { return };
    let customer = h.customer(dec!(1000)).await;
    let sale = h
        .sale(
            customer,
            dec!(400),
            date(2026, 3, 1),
            vec![
                h.pay(PaymentMethodKind::Cash, dec!(50)),
                PaymentInput {
                    method_id: h.method(PaymentMethodKind::Check),
                    amount: dec!(300),
                    check: Some(details("R-300")),
                },
            ],
        )
        .await;
    let sale_id = sale.sale.id;
    let cash = |amount| RecordPaymentInput {
        method_id: h.method(PaymentMethodKind::Cash),
        amount,
        payment_date: Some(date(2026, 4, 1)),
        check: None,
    };

    let checks = h.checks();
    let sales = h.sales();
    let (cleared, first, second) = tokio::join!(
        checks.mark_cleared(sale.checks[0].id, Some(date(2026, 4, 1)), None),
        sales.record_payment(sale_id, cash(dec!(50)), None),
        sales.record_payment(sale_id, cash(dec!(50)), None),
    );

    let ClearingEffect::SaleCredit { surplus, .. } = cleared.unwrap().effect else {
        panic!("expected a sale credit");
    };
    assert_eq!(surplus, Decimal::ZERO);
    // Only one of the two payments fits the 50 left unassigned.
    let payments = [first, second];
    assert_eq!(payments.iter().filter(|p| p.is_ok()).count(), 1);
    assert!(
        payments
            .iter()
            .any(|p| matches!(p, Err(LedgerError::Overpayment { .. })))
    );

    let rec = h.sales().reconcile(sale_id).await.unwrap();
    assert_eq!(rec.collected, dec!(400));
    assert_eq!(rec.amount_due, Decimal::ZERO);
    assert_eq!(rec.payment_status, PaymentStatus::Paid);

    let balance = h.ledger().balance_of(customer).await.unwrap();
    assert_eq!(balance.balance, Decimal::ZERO);
    assert_eq!(balance.surplus, Decimal::ZERO);
    assert_eq!(
        h.customers().get(customer).await.unwrap().current_balance,
        balance.balance
    );
}
