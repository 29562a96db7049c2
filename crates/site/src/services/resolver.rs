//! Listing URL resolution.
//!
//! A `/view-listing/{segment}` segment takes one of three shapes:
//!
//! - `42`: legacy numeric ID, redirected to the canonical slug when the
//!   listing has one
//! - `joes-cafe`: canonical slug, rendered directly
//! - `joes-cafe-42`: slug with an ID suffix, used when the exact slug is
//!   unknown (renamed listing, stale link) and redirected to the canonical slug
//!
//! Redirects carry a counter (`?redirects=N`) and stop at [`MAX_REDIRECTS`];
//! past that the resolver renders whatever it found.

use std::future::Future;

use nearby_core::ListingId;
use nearby_core::slug::{is_numeric, trailing_id};

use crate::db::{ListingRepository, RepositoryError};
use crate::models::Listing;

/// Redirects allowed in one resolution chain.
pub const MAX_REDIRECTS: u8 = 2;

/// Read access to active listings, as needed by [`resolve`].
pub trait ListingLookup {
    /// Active listing with this ID.
    fn active_by_id(
        &self,
        id: ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, RepositoryError>> + Send;

    /// Active listing with exactly this slug.
    fn active_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Listing>, RepositoryError>> + Send;
}

impl ListingLookup for ListingRepository<'_> {
    fn active_by_id(
        &self,
        id: ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, RepositoryError>> + Send {
        self.get_active_by_id(id)
    }

    fn active_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Listing>, RepositoryError>> + Send {
        self.get_active_by_slug(slug)
    }
}

/// Outcome of resolving a path segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Render this listing.
    Found(Listing),
    /// Redirect to the canonical slug; `redirects` is the updated counter.
    Redirect { slug: String, redirects: u8 },
    /// No active listing matches.
    NotFound,
}

/// Location of a canonical redirect under `prefix`, carrying the counter.
#[must_use]
pub fn redirect_location(prefix: &str, slug: &str, redirects: u8) -> String {
    format!("{prefix}/{slug}?redirects={redirects}")
}

/// Resolve a listing path segment.
///
/// `redirects` is the number of redirects already taken in this chain.
///
/// # Errors
///
/// Returns the lookup's `RepositoryError` unchanged.
pub async fn resolve<L: ListingLookup + Sync>(
    lookup: &L,
    segment: &str,
    redirects: u8,
) -> Result<Resolution, RepositoryError> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Ok(Resolution::NotFound);
    }

    if is_numeric(segment) {
        let Ok(id) = segment.parse::<ListingId>() else {
            return Ok(Resolution::NotFound);
        };
        return Ok(match lookup.active_by_id(id).await? {
            Some(listing) => canonicalize(listing, segment, redirects),
            None => Resolution::NotFound,
        });
    }

    if let Some(listing) = lookup.active_by_slug(segment).await? {
        return Ok(Resolution::Found(listing));
    }

    let Some(id) = trailing_id(segment) else {
        return Ok(Resolution::NotFound);
    };

    Ok(match lookup.active_by_id(id).await? {
        Some(listing) => canonicalize(listing, segment, redirects),
        None => Resolution::NotFound,
    })
}

/// Redirect to the canonical slug when it differs from what was requested
/// and the budget allows; otherwise render.
fn canonicalize(listing: Listing, requested: &str, redirects: u8) -> Resolution {
    match listing.slug.as_deref() {
        Some(slug) if slug != requested && redirects < MAX_REDIRECTS => Resolution::Redirect {
            slug: slug.to_string(),
            redirects: redirects.saturating_add(1),
        },
        _ => Resolution::Found(listing),
    }
}
