//! Listing repository.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use nearby_core::slug::unique_listing_slug;
use nearby_core::{BoundingBox, Coordinates, Email, ListingId, ListingType};

use super::RepositoryError;
use crate::models::{Listing, ListingImage};

const LISTING_COLUMNS: &str = "id, slug, business_name, address, description, phone, website, \
     latitude, longitude, active, featured, industry, category, listing_type, created_by, \
     created_at, updated_at";

/// Public search ordering: featured first, premium before basic, newest first.
const SEARCH_ORDER: &str = "featured DESC, (listing_type = 'premium') DESC, created_at DESC, id DESC";

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: i32,
    slug: Option<String>,
    business_name: String,
    address: String,
    description: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    active: bool,
    featured: bool,
    industry: Option<String>,
    category: Option<String>,
    listing_type: ListingType,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = RepositoryError;

    fn try_from(r: ListingRow) -> Result<Self, Self::Error> {
        let created_by = Email::parse(&r.created_by).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid created_by on listing {}: {e}", r.id))
        })?;

        Ok(Self {
            id: ListingId::new(r.id),
            slug: r.slug,
            business_name: r.business_name,
            address: r.address,
            description: r.description,
            phone: r.phone,
            website: r.website,
            coordinates: Coordinates::from_columns(r.latitude, r.longitude),
            active: r.active,
            featured: r.featured,
            industry: r.industry,
            category: r.category,
            listing_type: r.listing_type,
            created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn into_listings(rows: Vec<ListingRow>) -> Result<Vec<Listing>, RepositoryError> {
    rows.into_iter().map(Listing::try_from).collect()
}

/// Query-layer predicates for a public search.
///
/// The location rule itself runs in memory afterwards; `bounds` only narrows
/// the candidates fetched.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub industry: Option<String>,
    pub category: Option<String>,
    pub bounds: Option<BoundingBox>,
}

/// Fields for a new listing created from an address selection.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub business_name: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub industry: Option<String>,
    pub category: Option<String>,
    pub created_by: Email,
}

/// Editable listing fields. `None` leaves a field unchanged.
///
/// Nullable columns take `Some(None)` to clear them.
#[derive(Debug, Clone, Default)]
pub struct ListingUpdate {
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub description: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub coordinates: Option<Option<Coordinates>>,
    pub industry: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub listing_type: Option<ListingType>,
}

/// Repository for listing database operations.
pub struct ListingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ListingRepository<'a> {
    /// Create a new listing repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an active listing by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_id(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listing WHERE id = $1 AND active = true"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    /// Get an active listing by exact slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Listing>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listing WHERE slug = $1 AND active = true"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    /// Fetch active listings matching the query-layer predicates.
    ///
    /// With `bounds`, listings without coordinates are not returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>, RepositoryError> {
        let (min_lat, max_lat, min_lng, max_lng) = filter.bounds.map_or(
            (None, None, None, None),
            |b| (Some(b.min_lat), Some(b.max_lat), Some(b.min_lng), Some(b.max_lng)),
        );

        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            r"
            SELECT {LISTING_COLUMNS}
            FROM listing
            WHERE active = true
              AND ($1::text IS NULL OR industry = $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::float8 IS NULL OR latitude BETWEEN $3 AND $4)
              AND ($5::float8 IS NULL OR longitude BETWEEN $5 AND $6)
            ORDER BY {SEARCH_ORDER}
            "
        ))
        .bind(filter.industry.as_deref())
        .bind(filter.category.as_deref())
        .bind(min_lat)
        .bind(max_lat)
        .bind(min_lng)
        .bind(max_lng)
        .fetch_all(self.pool)
        .await?;

        debug!(count = rows.len(), "Fetched search candidates");
        into_listings(rows)
    }

    /// All listings, including inactive ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Listing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listing ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        into_listings(rows)
    }

    /// Get a listing by ID regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listing WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    /// Create an inactive, basic listing and assign its slug.
    ///
    /// The row is inserted first so its ID can break slug collisions, then
    /// the slug is set in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug races with another insert.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new), fields(business_name = %new.business_name))]
    pub async fn create(&self, new: &NewListing) -> Result<Listing, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO listing (
                business_name, address, latitude, longitude,
                industry, category, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&new.business_name)
        .bind(&new.address)
        .bind(new.coordinates.map(|c| c.lat))
        .bind(new.coordinates.map(|c| c.lng))
        .bind(new.industry.as_deref())
        .bind(new.category.as_deref())
        .bind(&new.created_by)
        .fetch_one(&mut *tx)
        .await?;

        let id = ListingId::new(id);
        let listing = assign_slug(&mut tx, id, &new.business_name).await?;

        tx.commit().await?;
        debug!(listing_id = %id, slug = ?listing.slug, "Created listing");
        Ok(listing)
    }

    /// Apply an edit. The slug is never changed by an edit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ListingId,
        update: &ListingUpdate,
    ) -> Result<Listing, RepositoryError> {
        let coords = update.coordinates;
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r"
            UPDATE listing SET
                business_name = COALESCE($2, business_name),
                address = COALESCE($3, address),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                phone = CASE WHEN $6 THEN $7 ELSE phone END,
                website = CASE WHEN $8 THEN $9 ELSE website END,
                latitude = CASE WHEN $10 THEN $11 ELSE latitude END,
                longitude = CASE WHEN $10 THEN $12 ELSE longitude END,
                industry = CASE WHEN $13 THEN $14 ELSE industry END,
                category = CASE WHEN $15 THEN $16 ELSE category END,
                listing_type = COALESCE($17, listing_type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.business_name.as_deref())
        .bind(update.address.as_deref())
        .bind(update.description.is_some())
        .bind(update.description.clone().flatten())
        .bind(update.phone.is_some())
        .bind(update.phone.clone().flatten())
        .bind(update.website.is_some())
        .bind(update.website.clone().flatten())
        .bind(coords.is_some())
        .bind(coords.flatten().map(|c| c.lat))
        .bind(coords.flatten().map(|c| c.lng))
        .bind(update.industry.is_some())
        .bind(update.industry.clone().flatten())
        .bind(update.category.is_some())
        .bind(update.category.clone().flatten())
        .bind(update.listing_type)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Set the `active` flag (publish / unpublish).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    pub async fn set_active(&self, id: ListingId, active: bool) -> Result<Listing, RepositoryError> {
        self.set_flag("active", id, active).await
    }

    /// Set the `featured` flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    pub async fn set_featured(
        &self,
        id: ListingId,
        featured: bool,
    ) -> Result<Listing, RepositoryError> {
        self.set_flag("featured", id, featured).await
    }

    async fn set_flag(
        &self,
        column: &'static str,
        id: ListingId,
        value: bool,
    ) -> Result<Listing, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "UPDATE listing SET {column} = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a listing and its images.
    ///
    /// Image rows are removed before the listing row, inside one transaction.
    /// Returns the deleted images so their stored objects can be cleaned up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist
    /// (nothing is deleted in that case).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ListingId) -> Result<Vec<ListingImage>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let images = super::listing_images::delete_for_listing(&mut tx, id).await?;

        let deleted = sqlx::query("DELETE FROM listing WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        debug!(listing_id = %id, images = images.len(), "Deleted listing");
        Ok(images)
    }

    /// Listings that have no slug yet, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn without_slug(&self) -> Result<Vec<Listing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listing WHERE slug IS NULL ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        into_listings(rows)
    }

    /// Compute the slug a listing would receive, without writing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn preview_slug(&self, id: ListingId, name: &str) -> Result<String, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let taken = slugs_taken(&mut *conn, id, name).await?;
        Ok(unique_listing_slug(name, id, |s| taken.contains(s)))
    }

    /// Assign a slug to a listing that has none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the chosen slug was taken concurrently.
    /// Returns `RepositoryError::NotFound` if the listing is gone or already has a slug.
    pub async fn backfill_slug(&self, id: ListingId, name: &str) -> Result<Listing, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let listing = assign_slug(&mut tx, id, name).await?;
        tx.commit().await?;
        Ok(listing)
    }
}

/// Existing slugs another listing holds that `name` could collide with.
async fn slugs_taken(
    conn: &mut sqlx::PgConnection,
    id: ListingId,
    name: &str,
) -> Result<HashSet<String>, RepositoryError> {
    let base = nearby_core::slug::listing_slug(name, id);
    // Slugs hold only [a-z0-9-], so the prefix needs no LIKE escaping
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT slug FROM listing WHERE (slug = $1 OR slug LIKE $2) AND id <> $3",
    )
    .bind(&base)
    .bind(format!("{base}-%"))
    .bind(id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|(slug,)| slug).collect())
}

/// Set the slug on a listing whose slug is still NULL.
async fn assign_slug(
    tx: &mut Transaction<'_, Postgres>,
    id: ListingId,
    name: &str,
) -> Result<Listing, RepositoryError> {
    let taken = slugs_taken(&mut **tx, id, name).await?;
    let slug = unique_listing_slug(name, id, |s| taken.contains(s));

    let row = sqlx::query_as::<_, ListingRow>(&format!(
        "UPDATE listing SET slug = $2 WHERE id = $1 AND slug IS NULL RETURNING {LISTING_COLUMNS}"
    ))
    .bind(id)
    .bind(&slug)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| RepositoryError::from_write(e, "slug already exists"))?;

    row.ok_or(RepositoryError::NotFound)?.try_into()
}
