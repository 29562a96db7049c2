//! Google sign-in route handlers.
//!
//! - Sign-in: store CSRF state and nonce in the session, redirect to Google
//! - Callback: verify state, exchange the code, gate on the admin allow-list
//! - Sign-out: delete the session
//!
//! A rejected sign-in leaves no session and no user row behind.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_session, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::OAuthError;
use crate::services::oauth::generate_random_string;
use crate::state::AppState;

const DENIED_PATH: &str = "/auth/denied";

/// Query parameters for `GET /auth/signin`.
#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    /// Local path to return to after a successful sign-in.
    pub return_to: Option<String>,
}

/// Query parameters from the Google callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Access-denied page. Shows nothing about the session.
#[derive(Template, WebTemplate)]
#[template(path = "auth/denied.html")]
pub struct DeniedTemplate;

/// Start sign-in.
///
/// # Route
///
/// `GET /auth/signin`
pub async fn signin(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SignInQuery>,
) -> Result<Redirect> {
    let oauth_state = generate_random_string(32);
    let nonce = generate_random_string(32);

    session.insert(session_keys::OAUTH_STATE, &oauth_state).await?;
    session.insert(session_keys::OAUTH_NONCE, &nonce).await?;
    if let Some(return_to) = query.return_to.as_deref().and_then(local_path) {
        session.insert(session_keys::RETURN_TO, return_to).await?;
    }

    let auth_url = state.oauth().authorization_url(
        &state.config().oauth_redirect_uri(),
        &oauth_state,
        &nonce,
    );

    Ok(Redirect::to(&auth_url))
}

/// Handle the Google callback.
///
/// # Route
///
/// `GET /auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "OAuth provider returned an error");
        return deny(&session).await;
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback missing code");
        return deny(&session).await;
    };

    let stored_state: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();
    let _ = session.remove::<String>(session_keys::OAUTH_NONCE).await;

    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!("OAuth state mismatch");
        return deny(&session).await;
    }

    let identity = match state
        .oauth()
        .exchange_code(&code, &state.config().oauth_redirect_uri())
        .await
    {
        Ok(identity) => identity,
        Err(OAuthError::UnverifiedEmail | OAuthError::InvalidEmail(_)) => {
            tracing::warn!("OAuth identity has no usable verified e-mail");
            return deny(&session).await;
        }
        Err(e) => return Err(e.into()),
    };

    if !state.admins().is_admin(&identity.email) {
        tracing::warn!("Sign-in rejected: e-mail is not on the admin allow-list");
        return deny(&session).await;
    }

    let user = UserRepository::new(state.pool())
        .upsert_sign_in(
            &identity.email,
            identity.name.as_deref(),
            identity.picture.as_deref(),
        )
        .await?;

    let return_to: Option<String> = session
        .remove(session_keys::RETURN_TO)
        .await
        .ok()
        .flatten();

    // New session ID on privilege change
    session.cycle_id().await?;
    set_current_user(
        &session,
        &CurrentUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        },
    )
    .await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "Admin signed in");

    let target = return_to.as_deref().and_then(local_path).unwrap_or("/");
    Ok(Redirect::to(target).into_response())
}

/// Sign out.
///
/// # Route
///
/// `POST /auth/signout`
pub async fn signout(session: Session) -> Result<Redirect> {
    clear_session(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

/// Access-denied page.
///
/// # Route
///
/// `GET /auth/denied`
pub async fn denied() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, DeniedTemplate)
}

/// Drop everything stored during the attempt and show the denied page.
async fn deny(session: &Session) -> Result<Response> {
    clear_session(session).await?;
    Ok(Redirect::to(DENIED_PATH).into_response())
}

/// Accept only same-site absolute paths as return targets.
fn local_path(path: &str) -> Option<&str> {
    let is_local = path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.contains(['\r', '\n']);
    is_local.then_some(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_rejects_open_redirects() {
        assert_eq!(local_path("/api/admin/listings"), Some("/api/admin/listings"));
        assert_eq!(local_path("/"), Some("/"));
        assert_eq!(local_path("//evil.example"), None);
        assert_eq!(local_path("/\\evil.example"), None);
        assert_eq!(local_path("https://evil.example"), None);
        assert_eq!(local_path("relative"), None);
    }

    #[test]
    fn test_denied_page_renders_without_session_details() {
        let html = DeniedTemplate.render().unwrap();
        assert!(html.contains("Access denied"));
        assert!(!html.contains("@"));
    }
}
