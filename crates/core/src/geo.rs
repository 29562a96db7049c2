//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Search radius around a selected place, in kilometers (inclusive).
pub const SEARCH_RADIUS_KM: f64 = 50.0;

/// Errors that can occur when constructing [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinatesError {
    /// Latitude outside [-90, 90] or not finite.
    #[error("latitude must be between -90 and 90 (got {0})")]
    Latitude(f64),
    /// Longitude outside [-180, 180] or not finite.
    #[error("longitude must be between -180 and 180 (got {0})")]
    Longitude(f64),
}

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatesError` if either component is out of range or not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinatesError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinatesError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Build coordinates from nullable database columns.
    ///
    /// Returns `None` unless both columns are present.
    #[must_use]
    pub fn from_columns(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }

    /// Great-circle distance to `other` in kilometers (Haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }

    /// Whether `other` lies within `radius_km` of this point (inclusive).
    #[must_use]
    pub fn is_within(&self, other: &Self, radius_km: f64) -> bool {
        self.distance_km(other) <= radius_km
    }
}

/// Haversine great-circle distance between two points, in kilometers.
///
/// `a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlng/2)`,
/// `c = 2·atan2(√a, √(1−a))`, `d = R·c`.
#[must_use]
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Widening applied to both spans so float rounding never drops a point
/// sitting on the circle (about a centimetre).
const ROUNDING_MARGIN_DEG: f64 = 1e-7;

/// Latitude/longitude rectangle enclosing a search circle.
///
/// Used to pre-filter candidates in SQL; the exact Haversine check still
/// runs afterwards, so the box only has to be a superset of the circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Smallest box around `center` containing every point within `radius_km`.
    ///
    /// Falls back to the full longitude range near the poles and when the
    /// circle crosses the antimeridian.
    #[must_use]
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let angular = radius_km / EARTH_RADIUS_KM;
        let d_lat = angular.to_degrees() + ROUNDING_MARGIN_DEG;
        let min_lat = (center.lat - d_lat).max(-90.0);
        let max_lat = (center.lat + d_lat).min(90.0);

        let cos_lat = center.lat.to_radians().cos();
        let full_range = Self {
            min_lat,
            max_lat,
            min_lng: -180.0,
            max_lng: 180.0,
        };

        // The circle reaches furthest east and west at a latitude poleward of
        // the center, so the longitude span is asin(sin r / cos lat), wider
        // than r / cos lat.
        let sin_ratio = angular.sin() / cos_lat;
        if min_lat <= -90.0 || max_lat >= 90.0 || cos_lat <= f64::EPSILON || sin_ratio >= 1.0 {
            return full_range;
        }

        let d_lng = sin_ratio.asin().to_degrees() + ROUNDING_MARGIN_DEG;
        let min_lng = center.lng - d_lng;
        let max_lng = center.lng + d_lng;

        if min_lng < -180.0 || max_lng > 180.0 {
            return full_range;
        }

        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Whether a point falls inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VANCOUVER: Coordinates = Coordinates {
        lat: 49.2827,
        lng: -123.1207,
    };
    const CALGARY: Coordinates = Coordinates {
        lat: 51.0447,
        lng: -114.0719,
    };

    #[test]
    fn test_same_point_is_zero_and_included() {
        let d = haversine_km(VANCOUVER, VANCOUVER);
        assert!(d.abs() < 1e-9);
        assert!(VANCOUVER.is_within(&VANCOUVER, SEARCH_RADIUS_KM));
    }

    #[test]
    fn test_vancouver_to_calgary_is_excluded() {
        let d = VANCOUVER.distance_km(&CALGARY);
        assert!((670.0..690.0).contains(&d), "got {d}");
        assert!(!VANCOUVER.is_within(&CALGARY, SEARCH_RADIUS_KM));
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = VANCOUVER.distance_km(&CALGARY);
        let back = CALGARY.distance_km(&VANCOUVER);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        // One degree of latitude is R * pi / 180 km; use exactly that as the radius.
        let north = Coordinates::new(VANCOUVER.lat + 1.0, VANCOUVER.lng).unwrap();
        let d = VANCOUVER.distance_km(&north);
        assert!(VANCOUVER.is_within(&north, d));
        assert!(!VANCOUVER.is_within(&north, d - 1e-6));
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(
            Coordinates::new(91.0, 0.0),
            Err(CoordinatesError::Latitude(91.0))
        );
        assert_eq!(
            Coordinates::new(0.0, -181.0),
            Err(CoordinatesError::Longitude(-181.0))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_from_columns_requires_both() {
        assert_eq!(Coordinates::from_columns(Some(1.0), None), None);
        assert_eq!(
            Coordinates::from_columns(Some(1.0), Some(2.0)),
            Some(Coordinates { lat: 1.0, lng: 2.0 })
        );
    }

    #[test]
    fn test_bounding_box_contains_circle_edge() {
        let bbox = BoundingBox::around(VANCOUVER, SEARCH_RADIUS_KM);
        assert!(bbox.contains(VANCOUVER));
        assert!(!bbox.contains(CALGARY));

        // A point due east at almost exactly 50 km must still be in the box.
        let east = Coordinates::new(VANCOUVER.lat, VANCOUVER.lng + 0.68).unwrap();
        assert!(VANCOUVER.distance_km(&east) < SEARCH_RADIUS_KM);
        assert!(bbox.contains(east));
    }

    #[test]
    fn test_bounding_box_contains_easternmost_point_at_high_latitude() {
        let center = Coordinates::new(60.0, 10.0).unwrap();
        let bbox = BoundingBox::around(center, SEARCH_RADIUS_KM);

        // Where a 49.999 km circle reaches furthest east: poleward of the
        // center latitude, beyond r / cos(lat).
        let r = 49.999 / EARTH_RADIUS_KM;
        let phi = center.lat.to_radians();
        let edge = Coordinates::new(
            (phi.sin() / r.cos()).asin().to_degrees(),
            center.lng + (r.sin() / phi.cos()).asin().to_degrees(),
        )
        .unwrap();

        assert!(center.distance_km(&edge) <= SEARCH_RADIUS_KM);
        assert!(bbox.contains(edge));

        let west = Coordinates::new(edge.lat, 2.0f64.mul_add(center.lng, -edge.lng)).unwrap();
        assert!(bbox.contains(west));
    }

    #[test]
    fn test_bounding_box_widens_across_antimeridian() {
        let fiji = Coordinates::new(-17.7, 179.9).unwrap();
        let bbox = BoundingBox::around(fiji, SEARCH_RADIUS_KM);
        assert!((bbox.min_lng - -180.0).abs() < f64::EPSILON);
        assert!((bbox.max_lng - 180.0).abs() < f64::EPSILON);
    }
}
