//! Payment methods and the per-process method registry.
//!
//! Special behaviour hangs off a stable `kind`, never off the display name.

use std::collections::HashMap;
use std::fmt;

use cuentas_shared::types::PaymentMethodId;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Behavioural category of a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    /// Cash.
    Cash,
    /// Bank transfer.
    Transfer,
    /// Debit or credit card.
    Card,
    /// Postdated check. Spawns a pending check.
    Check,
    /// Charge to the customer's running account.
    RunningAccount,
    /// Any other immediate collection.
    Other,
}

impl PaymentMethodKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::Card => "card",
            Self::Check => "check",
            Self::RunningAccount => "running_account",
            Self::Other => "other",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "transfer" => Some(Self::Transfer),
            "card" => Some(Self::Card),
            "check" => Some(Self::Check),
            "running_account" => Some(Self::RunningAccount),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Money is in hand as soon as the payment is recorded.
    #[must_use]
    pub fn counts_as_collected(&self) -> bool {
        !self.registers_debt()
    }

    /// The payment becomes running-account debt until settled.
    #[must_use]
    pub fn registers_debt(&self) -> bool {
        matches!(self, Self::Check | Self::RunningAccount)
    }

    /// The payment creates a pending check.
    #[must_use]
    pub fn spawns_check(&self) -> bool {
        matches!(self, Self::Check)
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A configured payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Unique identifier.
    pub id: PaymentMethodId,
    /// Display name.
    pub name: String,
    /// Behavioural kind.
    pub kind: PaymentMethodKind,
    /// Inactive methods cannot take new payments.
    pub active: bool,
}

/// Payment methods resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct PaymentMethodRegistry {
    methods: HashMap<PaymentMethodId, PaymentMethod>,
}

impl PaymentMethodRegistry {
    /// Builds a registry from loaded methods.
    pub fn new(methods: impl IntoIterator<Item = PaymentMethod>) -> Self {
        Self {
            methods: methods.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    /// Resolves an active method by id.
    pub fn resolve(&self, id: PaymentMethodId) -> Result<&PaymentMethod, LedgerError> {
        let method = self
            .methods
            .get(&id)
            .ok_or(LedgerError::PaymentMethodNotFound(id))?;
        if !method.active {
            return Err(LedgerError::validation(
                "method_id",
                format!("payment method '{}' is inactive", method.name),
            ));
        }
        Ok(method)
    }

    /// All methods ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<&PaymentMethod> {
        let mut methods: Vec<&PaymentMethod> = self.methods.values().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods
    }

    /// First active method of `kind`, by name.
    #[must_use]
    pub fn first_of_kind(&self, kind: PaymentMethodKind) -> Option<&PaymentMethod> {
        self.all()
            .into_iter()
            .find(|method| method.kind == kind && method.active)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, kind: PaymentMethodKind, active: bool) -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::new(),
            name: name.to_string(),
            kind,
            active,
        }
    }

    #[test]
    fn test_kind_semantics() {
        assert!(PaymentMethodKind::Cash.counts_as_collected());
        assert!(PaymentMethodKind::Other.counts_as_collected());
        assert!(!PaymentMethodKind::Check.counts_as_collected());
        assert!(PaymentMethodKind::RunningAccount.registers_debt());
        assert!(PaymentMethodKind::Check.spawns_check());
        assert!(!PaymentMethodKind::RunningAccount.spawns_check());
        assert_eq!(
            PaymentMethodKind::parse("running_account"),
            Some(PaymentMethodKind::RunningAccount)
        );
        assert_eq!(PaymentMethodKind::parse("Cuenta Corriente"), None);
    }

    #[test]
    fn test_registry_resolves_by_id_not_name() {
        let cash = method("Efectivo", PaymentMethodKind::Cash, true);
        let account = method("Cuenta Corriente", PaymentMethodKind::RunningAccount, true);
        let registry = PaymentMethodRegistry::new([cash.clone(), account.clone()]);

        assert_eq!(registry.resolve(account.id).unwrap().kind, PaymentMethodKind::RunningAccount);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.all()[0].name, "Cuenta Corriente");
        assert_eq!(
            registry.first_of_kind(PaymentMethodKind::Cash).map(|m| m.id),
            Some(cash.id)
        );
        assert!(registry.first_of_kind(PaymentMethodKind::Check).is_none());
    }

    #[test]
    fn test_registry_rejects_unknown_and_inactive() {
        let retired = method("Vale", PaymentMethodKind::Other, false);
        let registry = PaymentMethodRegistry::new([retired.clone()]);

        assert!(matches!(
            registry.resolve(PaymentMethodId::new()),
            Err(LedgerError::PaymentMethodNotFound(_))
        ));
        assert!(matches!(
            registry.resolve(retired.id),
            Err(LedgerError::Validation { .. })
        ));
    }
}
