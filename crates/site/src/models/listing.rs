//! Listing domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use nearby_core::search::Searchable;
use nearby_core::{Coordinates, Email, ListingId, ListingImageId, ListingType};

/// A business listing.
///
/// Only listings with `active = true` are publicly visible. `slug`, once
/// assigned, never changes; legacy listings may not have one yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: ListingId,
    pub slug: Option<String>,
    pub business_name: String,
    pub address: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub active: bool,
    pub featured: bool,
    pub industry: Option<String>,
    pub category: Option<String>,
    pub listing_type: ListingType,
    pub created_by: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Public path segment: the slug when assigned, otherwise the numeric ID.
    #[must_use]
    pub fn path_segment(&self) -> String {
        self.slug
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Public URL path of the listing page.
    #[must_use]
    pub fn view_path(&self) -> String {
        format!("/view-listing/{}", self.path_segment())
    }
}

impl Searchable for Listing {
    fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    fn text_fields(&self) -> [Option<&str>; 3] {
        [
            Some(self.address.as_str()),
            Some(self.business_name.as_str()),
            self.description.as_deref(),
        ]
    }
}

/// An image attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingImage {
    pub id: ListingImageId,
    pub listing_id: ListingId,
    pub url: String,
    /// Object path inside the storage bucket, when the image was uploaded here.
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A listing together with its images.
#[derive(Debug, Clone, Serialize)]
pub struct ListingWithImages {
    #[serde(flatten)]
    pub listing: Listing,
    pub images: Vec<ListingImage>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::listing;

    #[test]
    fn test_view_path_prefers_slug() {
        assert_eq!(
            listing(4, Some("rosie-s-diner"), "Rosie's Diner").view_path(),
            "/view-listing/rosie-s-diner"
        );
        assert_eq!(listing(4, None, "Rosie's Diner").view_path(), "/view-listing/4");
    }

    #[test]
    fn test_serializes_listing_type_and_coordinates() {
        let json = serde_json::to_value(listing(1, Some("a"), "A")).unwrap_or_default();
        assert_eq!(json["listing_type"], "basic");
        assert!(json["coordinates"].is_null());
    }
}
