//! User domain type.

use chrono::{DateTime, Utc};

use nearby_core::{Email, UserId};

/// An identity that has signed in at least once.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    /// Avatar URL from the identity provider.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: DateTime<Utc>,
}
