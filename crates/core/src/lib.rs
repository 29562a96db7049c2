//! Nearby Core - Shared domain types and pure logic.
//!
//! This crate provides the pieces of the directory that do no I/O:
//! - `site` - Public directory, admin API, and Places proxy (axum)
//! - `cli` - Migrations and slug backfill
//!
//! # Architecture
//!
//! The core crate contains only types, traits, and pure functions - no
//! database access, no HTTP clients. Everything here is deterministic and
//! unit-tested in place.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, e-mail addresses, listing enums
//! - [`slug`] - URL slug generation and parsing
//! - [`geo`] - Coordinates and Haversine great-circle distance
//! - [`search`] - Location filtering over a fetched candidate set
//! - [`authz`] - Admin allow-list and capability resolution

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod geo;
pub mod search;
pub mod slug;
pub mod types;

pub use authz::{AdminAllowList, Capabilities, Capability};
pub use geo::{BoundingBox, Coordinates, CoordinatesError};
pub use types::*;
