//! Admin allow-list and capability resolution.
//!
//! [`AdminAllowList::capabilities`] is the only place that decides what an
//! identity may do. The session stores who is signed in, never what they are
//! allowed to do, so every check comes back here.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::types::{Email, EmailError};

/// A single admin permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create listings and edit their fields.
    ManageListings,
    /// Publish, unpublish and feature listings.
    PublishListings,
    /// Delete listings along with their images.
    DeleteListings,
    /// Upload and detach listing images.
    ManageImages,
}

impl Capability {
    /// Every capability, in display order.
    pub const ALL: [Self; 4] = [
        Self::ManageListings,
        Self::PublishListings,
        Self::DeleteListings,
        Self::ManageImages,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageListings => "manage_listings",
            Self::PublishListings => "publish_listings",
            Self::DeleteListings => "delete_listings",
            Self::ManageImages => "manage_images",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of capabilities held by an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    /// No capabilities at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The full admin set.
    #[must_use]
    pub fn admin() -> Self {
        Self(Capability::ALL.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Capabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Static set of admin e-mail addresses, loaded once from configuration.
///
/// Entries are normalized through [`Email`], so membership is
/// case-insensitive and ignores surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: BTreeSet<Email>,
}

impl AdminAllowList {
    /// Parse a comma-separated list such as `ADMIN_EMAILS`.
    ///
    /// Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid e-mail address.
    pub fn parse(list: &str) -> Result<Self, EmailError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Email::parse)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|emails| Self { emails })
    }

    /// Capabilities granted to `email`. Empty when the address is not listed.
    #[must_use]
    pub fn capabilities(&self, email: &Email) -> Capabilities {
        if self.emails.contains(email) {
            Capabilities::admin()
        } else {
            Capabilities::none()
        }
    }

    /// Whether `email` holds any admin capability.
    #[must_use]
    pub fn is_admin(&self, email: &Email) -> bool {
        !self.capabilities(email).is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl FromIterator<Email> for AdminAllowList {
    fn from_iter<I: IntoIterator<Item = Email>>(iter: I) -> Self {
        Self {
            emails: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn test_listed_email_gets_every_capability() {
        let list = AdminAllowList::parse("owner@example.com, Editor@Example.com").unwrap();
        let caps = list.capabilities(&email("editor@example.com"));

        for capability in Capability::ALL {
            assert!(caps.contains(capability), "missing {capability}");
        }
        assert!(list.is_admin(&email("OWNER@example.com")));
    }

    #[test]
    fn test_unlisted_email_gets_nothing() {
        let list = AdminAllowList::parse("owner@example.com").unwrap();
        let caps = list.capabilities(&email("visitor@example.com"));
        assert!(caps.is_empty());
        assert!(!list.is_admin(&email("visitor@example.com")));
    }

    #[test]
    fn test_parse_skips_blank_entries() {
        let list = AdminAllowList::parse(" a@b.c ,, ,d@e.f,").unwrap();
        assert_eq!(list.len(), 2);
        assert!(AdminAllowList::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_invalid_entry() {
        assert_eq!(
            AdminAllowList::parse("a@b.c,not-an-email"),
            Err(EmailError::MissingAtSymbol)
        );
    }

    #[test]
    fn test_capabilities_serialize_as_names() {
        let json = serde_json::to_string(&Capabilities::admin()).unwrap();
        assert_eq!(
            json,
            r#"["manage_listings","publish_listings","delete_listings","manage_images"]"#
        );
        assert_eq!(serde_json::to_string(&Capabilities::none()).unwrap(), "[]");
    }
}
