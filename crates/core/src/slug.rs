//! URL slugs for listing pages.
//!
//! A listing URL segment comes in three shapes:
//!
//! - `123` - legacy numeric ID
//! - `joes-cafe` - canonical slug
//! - `joes-cafe-123` - slug with the listing ID appended (used to break
//!   collisions, and tolerated when the name part has since drifted)
//!
//! Generation is plain ASCII: anything that is not `[a-z0-9]` becomes a
//! hyphen, so accented letters are dropped rather than transliterated.

use crate::types::ListingId;

/// Prefix used when a business name produces an empty slug.
pub const FALLBACK_PREFIX: &str = "business";

/// Turn a business name into a URL slug.
///
/// Lower-cases and trims the input, maps every character outside
/// `[a-z0-9]` to `-`, collapses hyphen runs, and strips leading and
/// trailing hyphens. The result may be empty.
///
/// ```
/// use nearby_core::slug::generate_slug;
///
/// assert_eq!(generate_slug("Joe's Café & Bar!!"), "joe-s-caf-bar");
/// assert_eq!(generate_slug("  Main   Street Deli "), "main-street-deli");
/// ```
#[must_use]
pub fn generate_slug(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_hyphen = false;

    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.trim_matches('-').to_string()
}

/// Slug for a listing, falling back to `business-{id}` for names that
/// contain no usable characters.
#[must_use]
pub fn listing_slug(name: &str, id: ListingId) -> String {
    let slug = generate_slug(name);
    if slug.is_empty() {
        format!("{FALLBACK_PREFIX}-{id}")
    } else {
        slug
    }
}

/// Slug for a listing that does not collide with an existing one.
///
/// `is_taken` reports whether a candidate is already used by another
/// listing. A taken base slug gets `-{id}` appended. That form can still be
/// held by a listing whose name ends in the same digits ("Joe's Cafe 5"), so
/// a counter follows until a free candidate turns up.
pub fn unique_listing_slug(name: &str, id: ListingId, is_taken: impl Fn(&str) -> bool) -> String {
    let base = listing_slug(name, id);
    if !is_taken(&base) {
        return base;
    }

    let suffixed = format!("{base}-{id}");
    if !is_taken(&suffixed) {
        return suffixed;
    }

    let free = (2u32..)
        .map(|n| format!("{suffixed}-{n}"))
        .find(|candidate| !is_taken(candidate));
    free.unwrap_or(suffixed)
}

/// Whether a URL segment is a legacy numeric ID (`^\d+$`).
#[must_use]
pub fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Extract the listing ID from a `{base}-{id}` segment (`-(\d+)$`).
///
/// Returns `None` when there is no hyphen-delimited numeric suffix or the
/// number does not fit a listing ID.
///
/// ```
/// use nearby_core::{ListingId, slug::trailing_id};
///
/// assert_eq!(trailing_id("joes-cafe-42"), Some(ListingId::new(42)));
/// assert_eq!(trailing_id("joes-cafe"), None);
/// ```
#[must_use]
pub fn trailing_id(segment: &str) -> Option<ListingId> {
    let (_, suffix) = segment.rsplit_once('-')?;
    if !is_numeric(suffix) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_slug_punctuation_runs() {
        assert_eq!(generate_slug("Joe's Café & Bar!!"), "joe-s-caf-bar");
    }

    #[test]
    fn test_generate_slug_collapses_and_trims() {
        assert_eq!(generate_slug("--Hello,   World--"), "hello-world");
        assert_eq!(generate_slug("A&W"), "a-w");
        assert_eq!(generate_slug("7-Eleven #123"), "7-eleven-123");
    }

    #[test]
    fn test_generate_slug_non_ascii_only_is_empty() {
        assert_eq!(generate_slug("ñ ü é"), "");
        assert_eq!(generate_slug("   "), "");
    }

    #[test]
    fn test_listing_slug_fallback() {
        assert_eq!(listing_slug("!!!", ListingId::new(17)), "business-17");
        assert_eq!(listing_slug("Rosie's Diner", ListingId::new(17)), "rosie-s-diner");
    }

    #[test]
    fn test_unique_listing_slug_appends_id_on_collision() {
        let existing: HashSet<String> = ["joe-s-cafe".to_string()].into();
        let taken = |s: &str| existing.contains(s);

        assert_eq!(unique_listing_slug("Joe's Cafe", ListingId::new(5), taken), "joe-s-cafe-5");
        assert_eq!(unique_listing_slug("Joe's Diner", ListingId::new(6), taken), "joe-s-diner");
    }

    #[test]
    fn test_unique_listing_slug_skips_suffix_held_by_another_name() {
        // "Joe's Cafe 5" already owns joe-s-cafe-5
        let existing: HashSet<String> =
            ["joe-s-cafe".to_string(), "joe-s-cafe-5".to_string(), "joe-s-cafe-5-2".to_string()]
                .into();
        let taken = |s: &str| existing.contains(s);

        assert_eq!(unique_listing_slug("Joe's Cafe", ListingId::new(5), taken), "joe-s-cafe-5-3");
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("123"));
        assert!(is_numeric("0"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("12a"));
        assert!(!is_numeric("-12"));
    }

    #[test]
    fn test_trailing_id() {
        assert_eq!(trailing_id("cafe-12"), Some(ListingId::new(12)));
        assert_eq!(trailing_id("a-b-c-3"), Some(ListingId::new(3)));
        assert_eq!(trailing_id("cafe-"), None);
        assert_eq!(trailing_id("cafe-12b"), None);
        assert_eq!(trailing_id("12"), None);
        assert_eq!(trailing_id("cafe-99999999999"), None);
    }
}
