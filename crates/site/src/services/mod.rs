//! Business logic services for the site.
//!
//! # Services
//!
//! - `resolver` - Listing URL segment resolution with canonical redirects
//! - `oauth` - Google sign-in (authorization-code flow)

pub mod oauth;
pub mod resolver;

pub use oauth::{GoogleIdentity, GoogleOAuthClient, OAuthError};
pub use resolver::{ListingLookup, MAX_REDIRECTS, Resolution, redirect_location, resolve};
