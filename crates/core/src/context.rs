//! Explicit ledger context built once per process.

use std::sync::Arc;
use std::time::Duration;

use crate::payment_method::PaymentMethodRegistry;

/// Settings and lookups shared by every ledger operation.
#[derive(Debug, Clone)]
pub struct LedgerContext {
    /// Payment methods resolved at startup.
    pub registry: Arc<PaymentMethodRegistry>,
    /// Upper bound for row-lock waits.
    pub lock_timeout: Duration,
    /// Window for flagging pending checks as due soon.
    pub check_warning_days: u32,
}

impl LedgerContext {
    /// Creates a context.
    #[must_use]
    pub fn new(registry: PaymentMethodRegistry, lock_timeout: Duration, check_warning_days: u32) -> Self {
        Self {
            registry: Arc::new(registry),
            lock_timeout,
            check_warning_days,
        }
    }

    /// Lock timeout in whole milliseconds, as Postgres expects it.
    #[must_use]
    pub fn lock_timeout_ms(&self) -> u128 {
        self.lock_timeout.as_millis()
    }
}
