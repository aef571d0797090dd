//! Common types used across the application.

pub mod currency;
pub mod id;

pub use currency::{Currency, minor_units_of, round_to_currency};
pub use id::*;
