//! Core types for Sugarloaf.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{round_money, to_minor_units, MoneyError};
pub use status::*;
