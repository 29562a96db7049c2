//! Google Places API (New) proxy client.
//!
//! # Architecture
//!
//! - The browser never sees the Places API key; it calls `/api/places/*` and
//!   the server forwards to `places.googleapis.com`
//! - In-memory caching via `moka` for API responses (5 minute TTL)
//! - Inputs are validated before any network call
//!
//! # Example
//!
//! ```rust,ignore
//! use nearby_site::places::PlacesClient;
//!
//! let client = PlacesClient::new(config.google.places_api_key.clone());
//! let suggestions = client.autocomplete("123 Main St").await?;
//! let details = client.details(&suggestions[0].place_prediction.place_id).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::PlacesClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Places API.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// No Places API key is configured.
    #[error("Places API key is not configured")]
    NotConfigured,

    /// Request input failed validation; no request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Places API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Rate limited by Google.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The place ID does not exist or has no location.
    #[error("Not found: {0}")]
    NotFound(String),
}
