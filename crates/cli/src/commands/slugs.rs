//! Slug backfill for legacy listings.
//!
//! ```bash
//! nearby-cli backfill-slugs --dry-run
//! nearby-cli backfill-slugs
//! ```
//!
//! Listings created before slugs existed are only reachable by numeric ID.
//! Each one gets `generate_slug(business_name)`, suffixed with its ID when
//! another listing already holds that slug.

use nearby_site::db::{ListingRepository, RepositoryError};

use super::{CommandError, connect};

/// Outcome counts for a backfill run.
#[derive(Debug, Default)]
pub struct BackfillSummary {
    pub assigned: usize,
    pub skipped: usize,
}

/// Assign slugs to every listing that has none.
///
/// With `dry_run`, the slugs are computed and logged but nothing is written.
pub async fn backfill(dry_run: bool) -> Result<BackfillSummary, CommandError> {
    let pool = connect().await?;
    let repo = ListingRepository::new(&pool);

    let pending = repo.without_slug().await?;
    tracing::info!(count = pending.len(), dry_run, "Listings without a slug");

    let mut summary = BackfillSummary::default();
    for listing in pending {
        if dry_run {
            let slug = repo.preview_slug(listing.id, &listing.business_name).await?;
            tracing::info!(listing_id = %listing.id, slug = %slug, "Would assign slug");
            summary.assigned += 1;
            continue;
        }

        match repo.backfill_slug(listing.id, &listing.business_name).await {
            Ok(updated) => {
                tracing::info!(
                    listing_id = %updated.id,
                    slug = updated.slug.as_deref().unwrap_or_default(),
                    "Assigned slug"
                );
                summary.assigned += 1;
            }
            // Someone else assigned it meanwhile, or a concurrent insert took the slug
            Err(e @ (RepositoryError::Conflict(_) | RepositoryError::NotFound)) => {
                tracing::warn!(listing_id = %listing.id, error = %e, "Skipped listing");
                summary.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(summary)
}
