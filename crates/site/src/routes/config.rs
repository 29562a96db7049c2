//! Client configuration and diagnostics routes.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{ConfigError, env_presence};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Browser Maps configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsConfig {
    pub api_key: String,
}

/// The browser Maps key. This key is public by nature and restricted by
/// referrer in the Google console.
///
/// # Route
///
/// `GET /api/maps/config`
pub async fn maps_config(State(state): State<AppState>) -> Result<Json<MapsConfig>> {
    let api_key = state
        .config()
        .google
        .maps_api_key
        .clone()
        .ok_or_else(|| {
            AppError::Config(ConfigError::MissingEnvVar(
                "GOOGLE_MAPS_API_KEY".to_string(),
            ))
        })?;

    Ok(Json(MapsConfig { api_key }))
}

/// Which environment variables are set, as booleans.
///
/// # Route
///
/// `GET /api/auth/check-env`
pub async fn check_env() -> Json<Map<String, Value>> {
    Json(
        env_presence()
            .into_iter()
            .map(|(key, present)| (key.to_string(), Value::Bool(present)))
            .collect(),
    )
}
