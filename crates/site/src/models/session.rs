//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use nearby_core::{Email, UserId};

/// Session-stored identity of the signed-in user.
///
/// Holds who the user is, never what they may do. Capabilities are
/// resolved from the allow-list on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name reported by the identity provider.
    pub name: Option<String>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for OAuth nonce (`OpenID` Connect replay protection).
    pub const OAUTH_NONCE: &str = "oauth_nonce";

    /// Key for the local path to return to after sign-in.
    pub const RETURN_TO: &str = "return_to";
}
