//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{MONEY_SCALE, MONEY_TOLERANCE, clamp_dust, exceeds_with_tolerance, round_money};
