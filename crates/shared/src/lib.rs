//! Shared types, errors, and configuration for Cuentas.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Money helpers with decimal precision and rounding tolerance
//! - The HTTP-facing error envelope
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
