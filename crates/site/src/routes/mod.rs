//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (database ping)
//! GET  /view-listing/{segment}        - Listing page (slug or legacy ID)
//!
//! # Public API
//! GET  /api/listings                  - Search (industry, category, lat, lng, address)
//! GET  /api/listings/{segment}        - Listing + images (slug or legacy ID)
//! POST /api/places/autocomplete       - Places autocomplete proxy
//! POST /api/places/textsearch         - Places text search proxy
//! POST /api/places/details            - Place coordinates + formatted address
//! GET  /api/maps/config               - Browser Maps key
//! GET  /api/auth/check-env            - Environment presence booleans
//! GET  /api/session                   - Signed-in identity + capabilities
//!
//! # Auth
//! GET  /auth/signin                   - Redirect to Google
//! GET  /auth/callback                 - Google callback (allow-list gate)
//! POST /auth/signout                  - End the session
//! GET  /auth/denied                   - Access-denied page
//!
//! # Admin (RequireAdmin)
//! GET    /api/admin/listings                      - All listings
//! POST   /api/admin/listings                      - Create (inactive, basic)
//! GET    /api/admin/listings/{id}                 - Listing + images
//! PUT    /api/admin/listings/{id}                 - Edit
//! DELETE /api/admin/listings/{id}                 - Delete images, then listing
//! POST   /api/admin/listings/{id}/publish         - Activate
//! POST   /api/admin/listings/{id}/unpublish       - Deactivate
//! POST   /api/admin/listings/{id}/feature         - Set featured flag
//! POST   /api/admin/listings/{id}/images          - Multipart upload
//! DELETE /api/admin/listings/{id}/images/{image}  - Detach image
//! ```

pub mod admin;
pub mod auth;
pub mod config;
pub mod listings;
pub mod places;
pub mod session;
pub mod view;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, places_rate_limiter};
use crate::state::AppState;
use crate::storage::MAX_IMAGE_BYTES;

/// Largest multipart upload request (several images at once).
const MAX_UPLOAD_REQUEST_BYTES: usize = 8 * MAX_IMAGE_BYTES;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signin", get(auth::signin))
        .route("/callback", get(auth::callback))
        .route("/signout", post(auth::signout))
        .route("/denied", get(auth::denied))
        .layer(auth_rate_limiter())
}

/// Create the Places proxy routes router.
pub fn places_routes() -> Router<AppState> {
    Router::new()
        .route("/autocomplete", post(places::autocomplete))
        .route("/textsearch", post(places::text_search))
        .route("/details", post(places::details))
        .layer(places_rate_limiter())
}

/// Create the admin listing routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index).post(admin::create))
        .route(
            "/{id}",
            get(admin::show).put(admin::update).delete(admin::delete),
        )
        .route("/{id}/publish", post(admin::publish))
        .route("/{id}/unpublish", post(admin::unpublish))
        .route("/{id}/feature", post(admin::feature))
        .route(
            "/{id}/images",
            post(admin::upload_images).layer(DefaultBodyLimit::max(MAX_UPLOAD_REQUEST_BYTES)),
        )
        .route(
            "/{id}/images/{image_id}",
            axum::routing::delete(admin::delete_image),
        )
}

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(listings::search))
        .route("/listings/{segment}", get(listings::show))
        .nest("/places", places_routes())
        .route("/maps/config", get(config::maps_config))
        .route("/auth/check-env", get(config::check_env))
        .route("/session", get(session::show))
        .nest("/admin/listings", admin_routes())
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/view-listing/{segment}", get(view::show))
        .nest("/api", api_routes())
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
