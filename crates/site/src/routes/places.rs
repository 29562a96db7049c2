//! Places proxy routes.
//!
//! The browser sends its query here instead of to Google so the Places key
//! stays server-side. Each search response echoes the client's `seq` so the
//! client can drop responses that arrive after a newer request.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::places::{PlaceDetails, Suggestion};
use crate::state::AppState;

/// Body of `POST /api/places/autocomplete` and `/api/places/textsearch`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub input: String,
    /// Client-side request sequence number, echoed back unchanged.
    pub seq: Option<u64>,
}

/// Suggestions in the autocomplete shape.
#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// Body of `POST /api/places/details`.
#[derive(Debug, Deserialize)]
pub struct DetailsRequest {
    #[serde(rename = "placeId", default)]
    pub place_id: String,
}

/// Address autocomplete.
///
/// # Route
///
/// `POST /api/places/autocomplete`
#[instrument(skip(state, body), fields(seq = ?body.seq))]
pub async fn autocomplete(
    State(state): State<AppState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SuggestionsResponse>> {
    let suggestions = state.places().autocomplete(&body.input).await?;
    Ok(Json(SuggestionsResponse {
        suggestions,
        seq: body.seq,
    }))
}

/// Free-text place search, same response shape as autocomplete.
///
/// # Route
///
/// `POST /api/places/textsearch`
#[instrument(skip(state, body), fields(seq = ?body.seq))]
pub async fn text_search(
    State(state): State<AppState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SuggestionsResponse>> {
    let suggestions = state.places().text_search(&body.input).await?;
    Ok(Json(SuggestionsResponse {
        suggestions,
        seq: body.seq,
    }))
}

/// Coordinates and formatted address for a selected suggestion.
///
/// # Route
///
/// `POST /api/places/details`
#[instrument(skip(state, body))]
pub async fn details(
    State(state): State<AppState>,
    Json(body): Json<DetailsRequest>,
) -> Result<Json<PlaceDetails>> {
    Ok(Json(state.places().details(&body.place_id).await?))
}
