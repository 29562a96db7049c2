//! Admin listing management API.
//!
//! Every handler takes [`RequireAdmin`] and checks the capability it needs.
//! New listings start inactive and basic; publishing is a separate action.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

use nearby_core::{Capability, Coordinates, ListingId, ListingImageId, ListingType};

use crate::db::{ListingImageRepository, ListingRepository, ListingUpdate, NewListing};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Listing, ListingImage, ListingWithImages};
use crate::state::AppState;
use crate::storage::{MAX_IMAGE_BYTES, image_extension};

/// Longest accepted business name.
const MAX_NAME_CHARS: usize = 200;

// =============================================================================
// Request bodies
// =============================================================================

/// Body of `POST /api/admin/listings`.
///
/// The address comes from a Places selection: either explicit coordinates or
/// a `placeId` the server resolves.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub address: String,
    pub place_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub industry: Option<String>,
    pub category: Option<String>,
}

/// Body of `PUT /api/admin/listings/{id}`.
///
/// Absent fields are left alone; `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub business_name: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub coordinates: Option<Option<Coordinates>>,
    #[serde(default, deserialize_with = "double_option")]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub listing_type: Option<ListingType>,
}

/// Body of `POST /api/admin/listings/{id}/feature`.
#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    pub featured: bool,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn required_text(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validated(coordinates: Coordinates) -> Result<Coordinates> {
    Coordinates::new(coordinates.lat, coordinates.lng)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

impl UpdateListingRequest {
    fn into_update(self) -> Result<ListingUpdate> {
        let website = self.website.map(optional_text);
        if let Some(Some(url)) = &website {
            let parsed = url::Url::parse(url)
                .map_err(|_| AppError::BadRequest("website must be a URL".to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::BadRequest(
                    "website must be an http(s) URL".to_string(),
                ));
            }
        }

        Ok(ListingUpdate {
            business_name: self
                .business_name
                .map(|v| required_text(&v, "businessName"))
                .transpose()?,
            address: self
                .address
                .map(|v| required_text(&v, "address"))
                .transpose()?,
            description: self.description.map(optional_text),
            phone: self.phone.map(optional_text),
            website,
            coordinates: self
                .coordinates
                .map(|c| c.map(validated).transpose())
                .transpose()?,
            industry: self.industry.map(optional_text),
            category: self.category.map(optional_text),
            listing_type: self.listing_type,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// All listings, including inactive ones.
///
/// # Route
///
/// `GET /api/admin/listings`
pub async fn index(State(state): State<AppState>, admin: RequireAdmin) -> Result<Json<Vec<Listing>>> {
    admin.require(Capability::ManageListings)?;
    Ok(Json(ListingRepository::new(state.pool()).list_all().await?))
}

/// Create an inactive, basic listing from an address selection.
///
/// # Route
///
/// `POST /api/admin/listings`
#[instrument(skip(state, admin, body), fields(admin = %admin.user.id))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(body): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>)> {
    admin.require(Capability::ManageListings)?;

    let business_name = required_text(&body.business_name, "businessName")?;
    let place_id = optional_text(body.place_id);
    let mut address = body.address.trim().to_string();

    let coordinates = match (body.lat, body.lng, place_id) {
        (Some(lat), Some(lng), _) => Some(validated(Coordinates { lat, lng })?),
        (None, None, Some(place_id)) => {
            let details = state.places().details(&place_id).await?;
            if address.is_empty() {
                address = details.formatted_address;
            }
            Some(details.location)
        }
        (None, None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "lat and lng must be given together".to_string(),
            ));
        }
    };

    if address.is_empty() {
        return Err(AppError::BadRequest(
            "select an address for the listing".to_string(),
        ));
    }

    let listing = ListingRepository::new(state.pool())
        .create(&NewListing {
            business_name,
            address,
            coordinates,
            industry: optional_text(body.industry),
            category: optional_text(body.category),
            created_by: admin.user.email.clone(),
        })
        .await?;

    tracing::info!(listing_id = %listing.id, "Listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

/// One listing with its images, active or not.
///
/// # Route
///
/// `GET /api/admin/listings/{id}`
pub async fn show(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
) -> Result<Json<ListingWithImages>> {
    admin.require(Capability::ManageListings)?;

    let listing = ListingRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;
    let images = ListingImageRepository::new(state.pool())
        .list_for_listing(id)
        .await?;

    Ok(Json(ListingWithImages { listing, images }))
}

/// Edit listing fields. Last write wins.
///
/// # Route
///
/// `PUT /api/admin/listings/{id}`
#[instrument(skip(state, admin, body), fields(admin = %admin.user.id))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
    Json(body): Json<UpdateListingRequest>,
) -> Result<Json<Listing>> {
    admin.require(Capability::ManageListings)?;
    let update = body.into_update()?;
    if update.listing_type.is_some() {
        admin.require(Capability::PublishListings)?;
    }

    let listing = ListingRepository::new(state.pool()).update(id, &update).await?;
    tracing::info!(listing_id = %id, "Listing updated");
    Ok(Json(listing))
}

/// Make a listing publicly visible.
///
/// # Route
///
/// `POST /api/admin/listings/{id}/publish`
pub async fn publish(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
) -> Result<Json<Listing>> {
    set_active(&state, &admin, id, true).await
}

/// Hide a listing from the public directory.
///
/// # Route
///
/// `POST /api/admin/listings/{id}/unpublish`
pub async fn unpublish(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
) -> Result<Json<Listing>> {
    set_active(&state, &admin, id, false).await
}

async fn set_active(
    state: &AppState,
    admin: &RequireAdmin,
    id: ListingId,
    active: bool,
) -> Result<Json<Listing>> {
    admin.require(Capability::PublishListings)?;
    let listing = ListingRepository::new(state.pool())
        .set_active(id, active)
        .await?;
    tracing::info!(listing_id = %id, admin = %admin.user.id, active, "Listing visibility changed");
    Ok(Json(listing))
}

/// Toggle the featured flag.
///
/// # Route
///
/// `POST /api/admin/listings/{id}/feature`
pub async fn feature(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
    Json(body): Json<FeatureRequest>,
) -> Result<Json<Listing>> {
    admin.require(Capability::PublishListings)?;
    let listing = ListingRepository::new(state.pool())
        .set_featured(id, body.featured)
        .await?;
    tracing::info!(listing_id = %id, featured = body.featured, "Listing featured flag changed");
    Ok(Json(listing))
}

/// Result of deleting a listing.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: ListingId,
    pub images_deleted: usize,
}

/// Delete a listing and its images.
///
/// Image rows go first, then the listing, in one transaction. Stored objects
/// are removed afterwards; a failure there is logged and does not fail the
/// request.
///
/// # Route
///
/// `DELETE /api/admin/listings/{id}`
#[instrument(skip(state, admin), fields(admin = %admin.user.id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
) -> Result<Json<DeleteResponse>> {
    admin.require(Capability::DeleteListings)?;

    let images = ListingRepository::new(state.pool()).delete(id).await?;
    remove_stored_objects(&state, &images).await;

    tracing::info!(listing_id = %id, images = images.len(), "Listing deleted");
    Ok(Json(DeleteResponse {
        id,
        images_deleted: images.len(),
    }))
}

/// Outcome of one uploaded file.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Uploaded {
        file_name: String,
        image: ListingImage,
    },
    Failed {
        file_name: String,
        reason: String,
    },
}

/// Per-file results of an upload request.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub results: Vec<UploadOutcome>,
    pub uploaded: usize,
    pub failed: usize,
}

/// Upload images for a listing.
///
/// Files are handled one at a time. A failed file is reported and the rest
/// continue; earlier successes are kept.
///
/// # Route
///
/// `POST /api/admin/listings/{id}/images` (multipart)
#[instrument(skip(state, admin, multipart), fields(admin = %admin.user.id))]
pub async fn upload_images(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ListingId>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    admin.require(Capability::ManageImages)?;

    if ListingRepository::new(state.pool()).get(id).await?.is_none() {
        return Err(AppError::NotFound(format!("listing {id}")));
    }
    if !state.storage().is_configured() {
        return Err(crate::storage::StorageError::NotConfigured.into());
    }

    let images = ListingImageRepository::new(state.pool());
    let mut results = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                // The stream cannot continue past a malformed part.
                tracing::warn!(error = %e, "Multipart stream error");
                results.push(UploadOutcome::Failed {
                    file_name: String::new(),
                    reason: "malformed upload".to_string(),
                });
                break;
            }
        };

        let Some(file_name) = field.file_name().map(String::from) else {
            continue;
        };
        let content_type = field.content_type().map(String::from);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, file_name = %file_name, "Failed to read upload");
                results.push(UploadOutcome::Failed {
                    file_name,
                    reason: "could not read file".to_string(),
                });
                break;
            }
        };

        let extension = match check_image(content_type.as_deref(), data.len()) {
            Ok(extension) => extension,
            Err(reason) => {
                results.push(UploadOutcome::Failed { file_name, reason });
                continue;
            }
        };
        let content_type = content_type.unwrap_or_default();

        let stored = match state
            .storage()
            .upload_listing_image(id, &content_type, extension, data)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, file_name = %file_name, "Image upload failed");
                results.push(UploadOutcome::Failed {
                    file_name,
                    reason: "storage upload failed".to_string(),
                });
                continue;
            }
        };

        match images
            .insert(id, &stored.public_url, Some(&stored.path))
            .await
        {
            Ok(image) => results.push(UploadOutcome::Uploaded { file_name, image }),
            Err(e) => {
                tracing::error!(error = %e, file_name = %file_name, "Failed to record image");
                if let Err(e) = state.storage().remove(&[stored.path]).await {
                    tracing::warn!(error = %e, "Failed to remove orphaned upload");
                }
                results.push(UploadOutcome::Failed {
                    file_name,
                    reason: "failed to save image".to_string(),
                });
            }
        }
    }

    let uploaded = results
        .iter()
        .filter(|r| matches!(r, UploadOutcome::Uploaded { .. }))
        .count();
    let failed = results.len() - uploaded;
    tracing::info!(listing_id = %id, uploaded, failed, "Image upload finished");

    Ok(Json(UploadResponse {
        results,
        uploaded,
        failed,
    }))
}

/// Detach one image from a listing.
///
/// # Route
///
/// `DELETE /api/admin/listings/{id}/images/{image_id}`
pub async fn delete_image(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path((id, image_id)): Path<(ListingId, ListingImageId)>,
) -> Result<StatusCode> {
    admin.require(Capability::ManageImages)?;

    let image = ListingImageRepository::new(state.pool())
        .delete(id, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("image {image_id}")))?;
    remove_stored_objects(&state, std::slice::from_ref(&image)).await;

    tracing::info!(listing_id = %id, image_id = %image_id, "Image detached");
    Ok(StatusCode::NO_CONTENT)
}

/// Validate one file, returning its storage extension or a reason.
fn check_image(content_type: Option<&str>, size: usize) -> std::result::Result<&'static str, String> {
    let extension = content_type
        .and_then(image_extension)
        .ok_or_else(|| "not a supported image type".to_string())?;
    if size == 0 {
        return Err("file is empty".to_string());
    }
    if size > MAX_IMAGE_BYTES {
        return Err(format!(
            "file exceeds {} MiB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        ));
    }
    Ok(extension)
}

/// Best-effort removal of stored objects behind deleted image rows.
async fn remove_stored_objects(state: &AppState, images: &[ListingImage]) {
    let paths: Vec<String> = images
        .iter()
        .filter_map(|image| image.storage_path.clone())
        .collect();
    if paths.is_empty() || !state.storage().is_configured() {
        return;
    }
    if let Err(e) = state.storage().remove(&paths).await {
        tracing::warn!(error = %e, count = paths.len(), "Failed to remove stored images");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_image() {
        assert_eq!(check_image(Some("image/png"), 10), Ok("png"));
        assert!(check_image(Some("text/plain"), 10).is_err());
        assert!(check_image(None, 10).is_err());
        assert!(check_image(Some("image/jpeg"), 0).is_err());
        assert!(check_image(Some("image/jpeg"), MAX_IMAGE_BYTES + 1).is_err());
        assert!(check_image(Some("image/jpeg"), MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let body: UpdateListingRequest =
            serde_json::from_str(r#"{"description": null, "phone": " 555-0100 "}"#).unwrap();
        let update = body.into_update().unwrap();

        assert_eq!(update.description, Some(None));
        assert_eq!(update.phone, Some(Some("555-0100".to_string())));
        assert_eq!(update.website, None);
        assert_eq!(update.business_name, None);
    }

    #[test]
    fn test_update_request_validation() {
        let body: UpdateListingRequest =
            serde_json::from_str(r#"{"businessName": "   "}"#).unwrap();
        assert!(matches!(body.into_update(), Err(AppError::BadRequest(_))));

        let body: UpdateListingRequest =
            serde_json::from_str(r#"{"coordinates": {"lat": 120.0, "lng": 0.0}}"#).unwrap();
        assert!(matches!(body.into_update(), Err(AppError::BadRequest(_))));

        let body: UpdateListingRequest =
            serde_json::from_str(r#"{"website": "javascript:alert(1)"}"#).unwrap();
        assert!(matches!(body.into_update(), Err(AppError::BadRequest(_))));

        let body: UpdateListingRequest =
            serde_json::from_str(r#"{"coordinates": null, "listingType": "premium"}"#).unwrap();
        let update = body.into_update().unwrap();
        assert_eq!(update.coordinates, Some(None));
        assert_eq!(update.listing_type, Some(ListingType::Premium));
    }

    #[test]
    fn test_upload_outcome_shape() {
        let json = serde_json::to_value(UploadOutcome::Failed {
            file_name: "menu.pdf".to_string(),
            reason: "not a supported image type".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["file_name"], "menu.pdf");
    }
}
