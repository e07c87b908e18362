//! Customer account statements.

use chrono::NaiveDate;
use cuentas_shared::types::{CustomerId, LedgerEntryId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::LedgerTotals;
use super::entry::{EntryKind, LedgerEntry};
use super::error::LedgerError;

/// Statement line category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementLineType {
    /// Sale charged to the account.
    Sale,
    /// Money received.
    Payment,
    /// Manual correction.
    Adjustment,
}

impl From<EntryKind> for StatementLineType {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::SaleDebt => Self::Sale,
            EntryKind::Payment => Self::Payment,
            EntryKind::Adjustment => Self::Adjustment,
        }
    }
}

/// One chronological statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Source entry.
    pub entry_id: LedgerEntryId,
    /// Business date.
    pub date: NaiveDate,
    /// Line category.
    #[serde(rename = "type")]
    pub line_type: StatementLineType,
    /// Related sale.
    pub sale_id: Option<SaleId>,
    /// Entry description.
    pub description: Option<String>,
    /// Debit side.
    pub debit: Decimal,
    /// Credit side.
    pub credit: Decimal,
    /// Unsigned amount of the line.
    pub amount: Decimal,
    /// Debit minus credit accumulated so far, unclamped.
    pub running_balance: Decimal,
}

/// A customer's statement over an optional date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatement {
    /// The customer.
    pub customer_id: CustomerId,
    /// Window start, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Window end, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Net of everything before `date_from`.
    pub opening_balance: Decimal,
    /// Lines inside the window.
    pub lines: Vec<StatementLine>,
    /// Net at the end of the window, unclamped.
    pub closing_balance: Decimal,
    /// Amount owed at the end of the window, floored at zero.
    pub balance: Decimal,
    /// Credit in the customer's favour at the end of the window.
    pub surplus: Decimal,
}

/// Builds a statement from the customer's entries.
///
/// Entries are ordered by date and insertion sequence. Entries dated before
/// `date_from` fold into the opening balance; entries after `date_to` are left out.
pub fn build_statement(
    customer_id: CustomerId,
    entries: &[LedgerEntry],
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<CustomerStatement, LedgerError> {
    if let (Some(from), Some(to)) = (date_from, date_to)
        && from > to
    {
        return Err(LedgerError::validation(
            "date_from",
            "date_from must not be after date_to",
        ));
    }

    let mut ordered: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| e.customer_id == customer_id)
        .collect();
    ordered.sort_by_key(|e| (e.entry_date, e.sequence));

    let mut opening = LedgerTotals::default();
    let mut lines = Vec::new();
    let mut running = Decimal::ZERO;

    for entry in ordered {
        if date_from.is_some_and(|from| entry.entry_date < from) {
            opening.add(entry);
            continue;
        }
        if date_to.is_some_and(|to| entry.entry_date > to) {
            break;
        }
        if lines.is_empty() {
            running = opening.net();
        }
        running += entry.signed_amount();
        lines.push(StatementLine {
            entry_id: entry.id,
            date: entry.entry_date,
            line_type: entry.kind.into(),
            sale_id: entry.sale_id,
            description: entry.description.clone(),
            debit: entry.debit,
            credit: entry.credit,
            amount: entry.amount(),
            running_balance: running,
        });
    }

    let opening_balance = opening.net();
    let closing_balance = if lines.is_empty() {
        opening_balance
    } else {
        running
    };

    Ok(CustomerStatement {
        customer_id,
        date_from,
        date_to,
        opening_balance,
        lines,
        closing_balance,
        balance: closing_balance.max(Decimal::ZERO),
        surplus: (-closing_balance).max(Decimal::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn entry(c: CustomerId, seq: i64, kind: EntryKind, debit: Decimal, credit: Decimal, d: u32) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            sequence: seq,
            customer_id: c,
            sale_id: None,
            kind,
            debit,
            credit,
            entry_date: day(d),
            description: None,
            recorded_by: None,
            created_at: Utc::now(),
        }
    }

    fn sample(c: CustomerId) -> Vec<LedgerEntry> {
        vec![
            entry(c, 1, EntryKind::SaleDebt, dec!(300), dec!(0), 1),
            entry(c, 2, EntryKind::Payment, dec!(0), dec!(100), 5),
            entry(c, 4, EntryKind::SaleDebt, dec!(50), dec!(0), 10),
            entry(c, 3, EntryKind::Payment, dec!(0), dec!(400), 10),
        ]
    }

    #[test]
    fn test_full_statement_running_balance() {
        let c = CustomerId::new();
        let statement = build_statement(c, &sample(c), None, None).unwrap();

        let running: Vec<Decimal> = statement.lines.iter().map(|l| l.running_balance).collect();
        assert_eq!(running, vec![dec!(300), dec!(200), dec!(-200), dec!(-150)]);
        assert_eq!(statement.lines[2].line_type, StatementLineType::Payment);
        assert_eq!(statement.opening_balance, Decimal::ZERO);
        assert_eq!(statement.closing_balance, dec!(-150));
        assert_eq!(statement.balance, Decimal::ZERO);
        assert_eq!(statement.surplus, dec!(150));
    }

    #[test]
    fn test_window_folds_opening_balance() {
        let c = CustomerId::new();
        let statement = build_statement(c, &sample(c), Some(day(5)), Some(day(9))).unwrap();

        assert_eq!(statement.opening_balance, dec!(300));
        assert_eq!(statement.lines.len(), 1);
        assert_eq!(statement.lines[0].amount, dec!(100));
        assert_eq!(statement.lines[0].running_balance, dec!(200));
        assert_eq!(statement.closing_balance, dec!(200));
        assert_eq!(statement.balance, dec!(200));
    }

    #[test]
    fn test_empty_window_keeps_opening() {
        let c = CustomerId::new();
        let statement = build_statement(c, &sample(c), Some(day(20)), None).unwrap();
        assert!(statement.lines.is_empty());
        assert_eq!(statement.opening_balance, dec!(-150));
        assert_eq!(statement.closing_balance, dec!(-150));
        assert_eq!(statement.surplus, dec!(150));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let c = CustomerId::new();
        assert!(matches!(
            build_statement(c, &[], Some(day(9)), Some(day(1))),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_line_serializes_type_field() {
        let c = CustomerId::new();
        let statement = build_statement(c, &sample(c), None, None).unwrap();
        let json = serde_json::to_value(&statement.lines[0]).unwrap();
        assert_eq!(json["type"], "sale");
    }
}
