//! Core types for the directory.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod listing;

pub use email::{Email, EmailError};
pub use id::*;
pub use listing::{ListingType, ListingTypeError};
