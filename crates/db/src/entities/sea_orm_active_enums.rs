//! `SeaORM` active enums mirroring the Postgres enum types.

use cuentas_core::checks::{CheckDirection as CoreCheckDirection, CheckState as CoreCheckState};
use cuentas_core::ledger::EntryKind as CoreEntryKind;
use cuentas_core::payment_method::PaymentMethodKind as CorePaymentMethodKind;
use cuentas_core::sales::PaymentStatus as CorePaymentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_kind")]
pub enum EntryKind {
    #[sea_orm(string_value = "sale_debt")]
    SaleDebt,
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "check_state")]
pub enum CheckState {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "cleared")]
    Cleared,
    #[sea_orm(string_value = "bounced")]
    Bounced,
    #[sea_orm(string_value = "voided")]
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "check_direction")]
pub enum CheckDirection {
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "issued")]
    Issued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method_kind")]
pub enum PaymentMethodKind {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "running_account")]
    RunningAccount,
    #[sea_orm(string_value = "other")]
    Other,
}

macro_rules! mirror_enum {
    ($db:ident, $core:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(EntryKind, CoreEntryKind, [SaleDebt, Payment, Adjustment]);
mirror_enum!(CheckState, CoreCheckState, [Pending, Cleared, Bounced, Voided]);
mirror_enum!(CheckDirection, CoreCheckDirection, [Received, Issued]);
mirror_enum!(PaymentStatus, CorePaymentStatus, [Pending, Partial, Paid]);
mirror_enum!(
    PaymentMethodKind,
    CorePaymentMethodKind,
    [Cash, Transfer, Card, Check, RunningAccount, Other]
);

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_enum_mirrors_round_trip() {
        for kind in PaymentMethodKind::iter() {
            let core: CorePaymentMethodKind = kind.into();
            assert_eq!(PaymentMethodKind::from(core), kind);
            assert_eq!(core.as_str(), kind.to_value());
        }
        for state in CheckState::iter() {
            let core: CoreCheckState = state.into();
            assert_eq!(core.as_str(), state.to_value());
        }
    }
}
