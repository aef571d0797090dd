//! Shared types, errors, and configuration for Ledgerkeep.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Currency codes with minor-unit rounding
//! - Application-wide error types
//! - Configuration management
//! - SMTP email delivery for alerts

pub mod config;
pub mod email;
pub mod error;
pub mod types;

pub use config::{AppConfig, EmailConfig, ProviderEndpointConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
