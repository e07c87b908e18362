//! Postdated checks.
//!
//! Checks received from customers or issued to suppliers share one lifecycle:
//! `pending` is initial and `cleared`, `bounced`, `voided` are terminal.

pub mod alerts;
pub mod lifecycle;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use alerts::{AlertLevel, CheckAlert, classify, pending_with_alerts};
pub use lifecycle::CheckLifecycle;
pub use types::{
    Check, CheckAdminUpdate, CheckDetails, CheckDirection, CheckParty, CheckState, CheckTransition,
    NewCheck,
};
