//! Domain models for the site.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod listing;
pub mod session;
pub mod user;

pub use listing::{Listing, ListingImage, ListingWithImages};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
