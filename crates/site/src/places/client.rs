//! Places API (New) client implementation.
//!
//! Caches suggestions and details using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use nearby_core::Coordinates;

use super::PlacesError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    AutocompleteResponse, DetailsResponse, PlaceDetails, Suggestion, TextSearchResponse,
};

const PLACES_BASE_URL: &str = "https://places.googleapis.com/v1";

/// Longest free-text input forwarded to Google.
pub const MAX_INPUT_CHARS: usize = 200;

/// Client for the Google Places API (New).
///
/// Cheap to clone; holds the API key server-side only.
#[derive(Clone)]
pub struct PlacesClient {
    inner: Arc<PlacesClientInner>,
}

struct PlacesClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl PlacesClient {
    /// Create a new Places client. Without a key every call fails with
    /// [`PlacesError::NotConfigured`].
    #[must_use]
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self::with_base_url(api_key, PLACES_BASE_URL)
    }

    /// Create a client against a different endpoint (e.g. a local stub).
    #[must_use]
    pub fn with_base_url(api_key: Option<SecretString>, base_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(PlacesClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                cache,
            }),
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.api_key.is_some()
    }

    /// Address autocomplete suggestions for partial input.
    ///
    /// # Errors
    ///
    /// Returns `PlacesError::InvalidInput` for empty or oversized input, and
    /// HTTP/upstream errors from the API.
    #[instrument(skip(self))]
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<Suggestion>, PlacesError> {
        let input = validate_input(input)?;
        let cache_key = CacheKey::query(CacheKey::Autocomplete, input);

        if let Some(CacheValue::Suggestions(hit)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for autocomplete");
            return Ok(hit);
        }

        let response: AutocompleteResponse = self
            .post("places:autocomplete", None, &json!({ "input": input }))
            .await?;

        let suggestions: Vec<Suggestion> = response
            .suggestions
            .into_iter()
            .filter_map(|s| s.place_prediction)
            .map(|place_prediction| Suggestion { place_prediction })
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Suggestions(suggestions.clone()))
            .await;

        Ok(suggestions)
    }

    /// Free-text place search, returned in the autocomplete shape.
    ///
    /// # Errors
    ///
    /// Same as [`Self::autocomplete`].
    #[instrument(skip(self))]
    pub async fn text_search(&self, input: &str) -> Result<Vec<Suggestion>, PlacesError> {
        let input = validate_input(input)?;
        let cache_key = CacheKey::query(CacheKey::TextSearch, input);

        if let Some(CacheValue::Suggestions(hit)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for text search");
            return Ok(hit);
        }

        let response: TextSearchResponse = self
            .post(
                "places:searchText",
                Some("places.id,places.formattedAddress,places.displayName"),
                &json!({ "textQuery": input }),
            )
            .await?;

        let suggestions: Vec<Suggestion> = response
            .places
            .into_iter()
            .map(super::types::TextSearchPlace::into_suggestion)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Suggestions(suggestions.clone()))
            .await;

        Ok(suggestions)
    }

    /// Location and formatted address of a place.
    ///
    /// # Errors
    ///
    /// Returns `PlacesError::InvalidInput` for a malformed place ID and
    /// `PlacesError::NotFound` if the place has no location.
    #[instrument(skip(self))]
    pub async fn details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let place_id = validate_place_id(place_id)?;
        let cache_key = CacheKey::Details(place_id.to_string());

        if let Some(CacheValue::Details(hit)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for place details");
            return Ok(hit);
        }

        let url = format!("{}/places/{place_id}", self.inner.base_url);
        let request = self
            .inner
            .client
            .get(&url)
            .header("X-Goog-FieldMask", "location,formattedAddress");
        let response: DetailsResponse = self.send(request).await?;

        let location = response
            .location
            .ok_or_else(|| PlacesError::NotFound(place_id.to_string()))?;
        let location = Coordinates::new(location.latitude, location.longitude)
            .map_err(|e| PlacesError::Upstream {
                status: 200,
                body: e.to_string(),
            })?;

        let details = PlaceDetails {
            location,
            formatted_address: response.formatted_address.unwrap_or_default(),
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Details(details.clone()))
            .await;

        Ok(details)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        field_mask: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<T, PlacesError> {
        let url = format!("{}/{method}", self.inner.base_url);
        let mut request = self.inner.client.post(&url).json(body);
        if let Some(mask) = field_mask {
            request = request.header("X-Goog-FieldMask", mask);
        }
        self.send(request).await
    }

    /// Attach the key, send, and decode, mapping rate limits and error statuses.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PlacesError> {
        let api_key = self
            .inner
            .api_key
            .as_ref()
            .ok_or(PlacesError::NotConfigured)?;

        let response = request
            .header("X-Goog-Api-Key", api_key.expose_secret())
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(PlacesError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Places API returned non-success status"
            );
            return Err(PlacesError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Trim and bound free-text input.
fn validate_input(input: &str) -> Result<&str, PlacesError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PlacesError::InvalidInput("input is required".to_string()));
    }
    if input.chars().count() > MAX_INPUT_CHARS {
        return Err(PlacesError::InvalidInput(format!(
            "input must be at most {MAX_INPUT_CHARS} characters"
        )));
    }
    Ok(input)
}

/// Place IDs are URL-safe tokens; anything else never reaches the URL path.
fn validate_place_id(place_id: &str) -> Result<&str, PlacesError> {
    let place_id = place_id.trim();
    if place_id.is_empty() {
        return Err(PlacesError::InvalidInput("placeId is required".to_string()));
    }
    if place_id.len() > 512
        || !place_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(PlacesError::InvalidInput("placeId is malformed".to_string()));
    }
    Ok(place_id)
}
