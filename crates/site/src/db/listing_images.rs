//! Listing image repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use nearby_core::{ListingId, ListingImageId};

use super::RepositoryError;
use crate::models::ListingImage;

#[derive(Debug, sqlx::FromRow)]
struct ListingImageRow {
    id: i32,
    listing_id: i32,
    url: String,
    storage_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ListingImageRow> for ListingImage {
    fn from(r: ListingImageRow) -> Self {
        Self {
            id: ListingImageId::new(r.id),
            listing_id: ListingId::new(r.listing_id),
            url: r.url,
            storage_path: r.storage_path,
            created_at: r.created_at,
        }
    }
}

/// Repository for listing image database operations.
pub struct ListingImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ListingImageRepository<'a> {
    /// Create a new listing image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Images for a listing, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<ListingImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingImageRow>(
            r"
            SELECT id, listing_id, url, storage_path, created_at
            FROM listing_images
            WHERE listing_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(listing_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingImage::from).collect())
    }

    /// Record an uploaded image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &self,
        listing_id: ListingId,
        url: &str,
        storage_path: Option<&str>,
    ) -> Result<ListingImage, RepositoryError> {
        let row = sqlx::query_as::<_, ListingImageRow>(
            r"
            INSERT INTO listing_images (listing_id, url, storage_path)
            VALUES ($1, $2, $3)
            RETURNING id, listing_id, url, storage_path, created_at
            ",
        )
        .bind(listing_id)
        .bind(url)
        .bind(storage_path)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Detach one image from a listing.
    ///
    /// Returns the removed row, or `None` if no such image belongs to the listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        listing_id: ListingId,
        image_id: ListingImageId,
    ) -> Result<Option<ListingImage>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingImageRow>(
            r"
            DELETE FROM listing_images
            WHERE id = $1 AND listing_id = $2
            RETURNING id, listing_id, url, storage_path, created_at
            ",
        )
        .bind(image_id)
        .bind(listing_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ListingImage::from))
    }
}

/// Delete every image row of a listing inside a caller's transaction.
pub(super) async fn delete_for_listing(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: ListingId,
) -> Result<Vec<ListingImage>, RepositoryError> {
    let rows = sqlx::query_as::<_, ListingImageRow>(
        r"
        DELETE FROM listing_images
        WHERE listing_id = $1
        RETURNING id, listing_id, url, storage_path, created_at
        ",
    )
    .bind(listing_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(ListingImage::from).collect())
}
