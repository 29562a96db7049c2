//! Public listing API: search and slug-or-ID lookup.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use nearby_core::geo::SEARCH_RADIUS_KM;
use nearby_core::search::{Located, LocationQuery, filter_by_location};
use nearby_core::{BoundingBox, Coordinates};

use crate::db::{ListingFilter, ListingImageRepository, ListingRepository};
use crate::error::{AppError, Result};
use crate::models::{Listing, ListingWithImages};
use crate::services::{Resolution, redirect_location, resolve};
use crate::state::AppState;

/// Upper bound on resolving a listing and loading its images.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters for `GET /api/listings`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub industry: Option<String>,
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Address label; used for text matching when no coordinates are given.
    pub address: Option<String>,
}

impl SearchQuery {
    /// Split into database predicates and the in-memory location rule.
    fn into_parts(self) -> Result<(ListingFilter, LocationQuery)> {
        let center = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(
                Coordinates::new(lat, lng).map_err(|e| AppError::BadRequest(e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(AppError::BadRequest(
                    "lat and lng must be given together".to_string(),
                ));
            }
        };

        let filter = ListingFilter {
            industry: non_blank(self.industry),
            category: non_blank(self.category),
            bounds: center.map(|c| BoundingBox::around(c, SEARCH_RADIUS_KM)),
        };
        let location = LocationQuery {
            center,
            label: non_blank(self.address),
        };
        Ok((filter, location))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Response body of a search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub listings: Vec<Located<Listing>>,
    pub count: usize,
}

/// Search active listings.
///
/// # Route
///
/// `GET /api/listings?industry=&category=&lat=&lng=&address=`
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let (filter, location) = query.into_parts()?;

    let candidates = ListingRepository::new(state.pool()).search(&filter).await?;
    let listings = filter_by_location(candidates, &location);

    Ok(Json(SearchResponse {
        count: listings.len(),
        listings,
    }))
}

/// Redirect counter carried in canonical redirects.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectsQuery {
    pub redirects: Option<u32>,
}

impl RedirectsQuery {
    /// Redirects taken so far; out-of-range values count as exhausted.
    #[must_use]
    pub fn taken(&self) -> u8 {
        self.redirects
            .map_or(0, |n| u8::try_from(n).unwrap_or(u8::MAX))
    }
}

/// Result of loading a listing for display.
pub enum LoadedListing {
    Found(ListingWithImages),
    /// Canonical redirect: slug and updated counter.
    Redirect { slug: String, redirects: u8 },
    NotFound,
}

/// Resolve a segment and load the listing's images, bounded by [`LOAD_TIMEOUT`].
///
/// # Errors
///
/// Returns `AppError::Timeout` when the deadline passes, and database errors
/// otherwise.
pub async fn load_listing(state: &AppState, segment: &str, redirects: u8) -> Result<LoadedListing> {
    tokio::time::timeout(LOAD_TIMEOUT, load_unbounded(state, segment, redirects))
        .await
        .map_err(|_| AppError::Timeout("loading the listing"))?
}

async fn load_unbounded(state: &AppState, segment: &str, redirects: u8) -> Result<LoadedListing> {
    let repo = ListingRepository::new(state.pool());
    Ok(match resolve(&repo, segment, redirects).await? {
        Resolution::Found(listing) => {
            let images = ListingImageRepository::new(state.pool())
                .list_for_listing(listing.id)
                .await?;
            LoadedListing::Found(ListingWithImages { listing, images })
        }
        Resolution::Redirect { slug, redirects } => LoadedListing::Redirect { slug, redirects },
        Resolution::NotFound => LoadedListing::NotFound,
    })
}

/// A single active listing with its images, by slug or numeric ID.
///
/// Non-canonical segments redirect to `/api/listings/{slug}?redirects=N`.
///
/// # Route
///
/// `GET /api/listings/{segment}`
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<RedirectsQuery>,
) -> Result<Response> {
    match load_listing(&state, &segment, query.taken()).await? {
        LoadedListing::Found(listing) => Ok(Json(listing).into_response()),
        LoadedListing::Redirect { slug, redirects } => Ok(Redirect::temporary(
            &redirect_location("/api/listings", &slug, redirects),
        )
        .into_response()),
        LoadedListing::NotFound => Err(AppError::NotFound("listing".to_string())),
    }
}
