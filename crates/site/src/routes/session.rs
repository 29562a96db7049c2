//! Session introspection for the header UI.

use axum::{Json, extract::State};
use serde::Serialize;

use nearby_core::{Capabilities, Email};

use crate::middleware::OptionalUser;
use crate::state::AppState;

/// Signed-in identity and the capabilities it currently resolves to.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub signed_in: bool,
    pub email: Option<Email>,
    pub name: Option<String>,
    pub is_admin: bool,
    pub capabilities: Capabilities,
}

/// Report the current session.
///
/// # Route
///
/// `GET /api/session`
pub async fn show(State(state): State<AppState>, OptionalUser(user): OptionalUser) -> Json<SessionInfo> {
    let Some(user) = user else {
        return Json(SessionInfo {
            signed_in: false,
            email: None,
            name: None,
            is_admin: false,
            capabilities: Capabilities::none(),
        });
    };

    let capabilities = state.admins().capabilities(&user.email);
    Json(SessionInfo {
        signed_in: true,
        is_admin: !capabilities.is_empty(),
        email: Some(user.email),
        name: user.name,
        capabilities,
    })
}
