//! Server-rendered listing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use nearby_core::ListingType;

use super::listings::{LoadedListing, RedirectsQuery, load_listing};
use crate::models::{Listing, ListingImage};
use crate::services::redirect_location;
use crate::state::AppState;

/// Listing detail page.
#[derive(Template, WebTemplate)]
#[template(path = "listings/show.html")]
pub struct ListingShowTemplate {
    pub listing: Listing,
    pub images: Vec<ListingImage>,
    pub premium: bool,
}

/// "Listing not found" page.
#[derive(Template, WebTemplate)]
#[template(path = "listings/not_found.html")]
pub struct ListingNotFoundTemplate;

/// Generic failure page; shows the public message only.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}

/// Render a listing by slug or legacy numeric ID.
///
/// # Route
///
/// `GET /view-listing/{segment}`
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<RedirectsQuery>,
) -> Response {
    match load_listing(&state, &segment, query.taken()).await {
        Ok(LoadedListing::Found(found)) => ListingShowTemplate {
            premium: found.listing.listing_type == ListingType::Premium,
            listing: found.listing,
            images: found.images,
        }
        .into_response(),
        Ok(LoadedListing::Redirect { slug, redirects }) => {
            Redirect::temporary(&redirect_location("/view-listing", &slug, redirects))
                .into_response()
        }
        Ok(LoadedListing::NotFound) => {
            (StatusCode::NOT_FOUND, ListingNotFoundTemplate).into_response()
        }
        Err(err) => {
            err.report();
            let status = err.status();
            (
                status,
                ErrorTemplate {
                    status: status.as_u16(),
                    message: err.public_message(),
                },
            )
                .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::listing::fixtures;

    #[test]
    fn test_show_template_escapes_listing_fields() {
        let mut listing = fixtures::listing(3, Some("rosies"), "Rosie <Diner>");
        listing.description = Some("Pancakes & coffee".to_string());

        let html = ListingShowTemplate {
            listing,
            images: Vec::new(),
            premium: true,
        }
        .render()
        .unwrap();

        assert!(!html.contains("<Diner>"));
        assert!(!html.contains("Pancakes & coffee"));
        // Named or numeric entities, depending on the escaper
        assert!(
            html.contains("Rosie &#60;Diner&#62;") || html.contains("Rosie &lt;Diner&gt;")
        );
        assert!(
            html.contains("Pancakes &#38; coffee") || html.contains("Pancakes &amp; coffee")
        );
        assert!(html.contains("Premium"));
    }

    #[test]
    fn test_error_template_shows_public_message() {
        let html = ErrorTemplate {
            status: 504,
            message: "Timed out while loading the listing".to_string(),
        }
        .render()
        .unwrap();

        assert!(html.contains("504"));
        assert!(html.contains("Timed out while loading the listing"));
    }
}
