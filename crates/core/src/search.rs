//! Location filtering over a fetched candidate set.
//!
//! The database query has already applied `active = true` and any
//! industry/category equality predicates (and, with a center, a bounding-box
//! pre-filter). This module applies the location rule on top:
//!
//! 1. Center given: keep candidates within [`SEARCH_RADIUS_KM`] (inclusive)
//!    by Haversine distance; candidates without coordinates are dropped.
//! 2. No center, non-empty address label: case-insensitive substring match
//!    against address, business name, or description.
//! 3. Neither: candidates pass through unchanged.
//!
//! Input order is preserved.

use serde::Serialize;

use crate::geo::{Coordinates, SEARCH_RADIUS_KM};

/// A record the location filter can inspect.
pub trait Searchable {
    /// Stored coordinates, if the record has been geocoded.
    fn coordinates(&self) -> Option<Coordinates>;

    /// Fields searched by the free-text fallback.
    fn text_fields(&self) -> [Option<&str>; 3];
}

/// Location part of a directory search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    /// Selected place, if the visitor picked one with coordinates.
    pub center: Option<Coordinates>,
    /// Free-text address label typed or selected by the visitor.
    pub label: Option<String>,
}

impl LocationQuery {
    /// Query around a known point.
    #[must_use]
    pub const fn near(center: Coordinates) -> Self {
        Self {
            center: Some(center),
            label: None,
        }
    }

    /// Query by free text only.
    #[must_use]
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            center: None,
            label: Some(label.into()),
        }
    }

    /// Whether this query filters anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.normalized_label().is_none()
    }

    fn normalized_label(&self) -> Option<String> {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_lowercase)
    }
}

/// A candidate that passed the location filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Located<T> {
    #[serde(flatten)]
    pub item: T,
    /// Distance from the query center in km, when filtering by center.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Apply the location rule to `candidates`.
pub fn filter_by_location<T: Searchable>(candidates: Vec<T>, query: &LocationQuery) -> Vec<Located<T>> {
    if let Some(center) = query.center {
        return candidates
            .into_iter()
            .filter_map(|item| {
                let distance = center.distance_km(&item.coordinates()?);
                (distance <= SEARCH_RADIUS_KM).then_some(Located {
                    item,
                    distance_km: Some(distance),
                })
            })
            .collect();
    }

    let Some(needle) = query.normalized_label() else {
        return candidates
            .into_iter()
            .map(|item| Located {
                item,
                distance_km: None,
            })
            .collect();
    };

    candidates
        .into_iter()
        .filter(|item| {
            item.text_fields()
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .map(|item| Located {
            item,
            distance_km: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Place {
        name: &'static str,
        address: &'static str,
        description: Option<&'static str>,
        at: Option<Coordinates>,
    }

    impl Searchable for Place {
        fn coordinates(&self) -> Option<Coordinates> {
            self.at
        }

        fn text_fields(&self) -> [Option<&str>; 3] {
            [Some(self.address), Some(self.name), self.description]
        }
    }

    const VANCOUVER: Coordinates = Coordinates {
        lat: 49.2827,
        lng: -123.1207,
    };

    fn places() -> Vec<Place> {
        vec![
            Place {
                name: "Gastown Coffee",
                address: "1 Water St, Vancouver",
                description: Some("Espresso bar"),
                at: Some(VANCOUVER),
            },
            Place {
                name: "Calgary Saddlery",
                address: "9 Stephen Ave, Calgary",
                description: None,
                at: Some(Coordinates {
                    lat: 51.0447,
                    lng: -114.0719,
                }),
            },
            Place {
                name: "Mystery Bakery",
                address: "Somewhere in Vancouver",
                description: Some("No geocode yet"),
                at: None,
            },
        ]
    }

    #[test]
    fn test_center_keeps_nearby_and_drops_uncoded() {
        let result = filter_by_location(places(), &LocationQuery::near(VANCOUVER));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].item.name, "Gastown Coffee");
        assert!(result[0].distance_km.is_some_and(|d| d.abs() < 1e-9));
    }

    #[test]
    fn test_center_wins_over_label() {
        let query = LocationQuery {
            center: Some(VANCOUVER),
            label: Some("Calgary".to_string()),
        };
        let result = filter_by_location(places(), &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].item.name, "Gastown Coffee");
    }

    #[test]
    fn test_label_matches_any_field_case_insensitively() {
        let result = filter_by_location(places(), &LocationQuery::text("VANCOUVER"));
        let names: Vec<_> = result.iter().map(|l| l.item.name).collect();
        assert_eq!(names, vec!["Gastown Coffee", "Mystery Bakery"]);

        let result = filter_by_location(places(), &LocationQuery::text("espresso"));
        assert_eq!(result.len(), 1);
        assert!(result[0].distance_km.is_none());
    }

    #[test]
    fn test_empty_query_passes_everything_through() {
        let result = filter_by_location(places(), &LocationQuery::default());
        assert_eq!(result.len(), 3);

        let blank = LocationQuery::text("   ");
        assert!(blank.is_empty());
        assert_eq!(filter_by_location(places(), &blank).len(), 3);
    }
}
