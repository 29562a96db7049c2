//! Listing enums shared by the site and the CLI.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown [`ListingType`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid listing type: {0}")]
pub struct ListingTypeError(pub String);

/// Presentation tier of a listing.
///
/// Basic listings show name, address, and contact details. Premium listings
/// additionally get image galleries and sort ahead of basic listings in
/// search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "listing_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    #[default]
    Basic,
    Premium,
}

impl std::fmt::Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for ListingType {
    type Err = ListingTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            _ => Err(ListingTypeError(s.to_string())),
        }
    }
}
