//! Authentication middleware and extractors.
//!
//! The session holds only the signed-in identity. Capabilities are resolved
//! from the allow-list on every request, so removing an address from
//! `ADMIN_EMAILS` revokes access on the next request.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use nearby_core::{Capabilities, Capability};

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user on the admin allow-list.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(admin: RequireAdmin) -> Result<impl IntoResponse, AppError> {
///     admin.require(Capability::PublishListings)?;
///     Ok(format!("Hello, {}!", admin.user.email))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub user: CurrentUser,
    pub capabilities: Capabilities,
}

impl RequireAdmin {
    /// Fail with 403 unless the admin holds `capability`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when the capability is missing.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.capabilities.contains(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("missing capability {capability}")))
        }
    }
}

/// Rejection for [`RequireAdmin`].
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in, page request: go sign in.
    RedirectToSignIn,
    /// Not signed in, API request.
    Unauthorized,
    /// Signed in without admin capabilities, page request.
    RedirectToDenied,
    /// Signed in without admin capabilities, API request.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to("/auth/signin").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::RedirectToDenied => Redirect::to("/auth/denied").into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = is_api_request(parts);

        let user = current_user(parts).await.ok_or(if is_api {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToSignIn
        })?;

        let capabilities = state.admins().capabilities(&user.email);
        if capabilities.is_empty() {
            tracing::warn!(user_id = %user.id, "Signed-in user is not an admin");
            return Err(if is_api {
                AuthRejection::Forbidden
            } else {
                AuthRejection::RedirectToDenied
            });
        }

        Ok(Self { user, capabilities })
    }
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; a missing or unreadable session yields `None`.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// API paths get status codes; pages get redirects. Nested routers strip
/// their prefix from `parts.uri`, so the original URI is checked first.
fn is_api_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.0.path())
        .starts_with("/api/")
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session entirely (sign-out or rejected sign-in).
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
