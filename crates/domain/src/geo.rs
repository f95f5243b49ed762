//! Geographic value types and spherical distance math.
//!
//! Coordinates are validated at construction so an out-of-range point is
//! unrepresentable anywhere downstream: the store, the proximity index, and
//! the feed all operate on points that are already known valid. Distances use
//! the haversine great-circle formula; at city scale (radius of a few km and
//! up) the flat-Euclidean approximation is measurably wrong.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical model).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated geographic point: longitude in [-180, 180], latitude in [-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

/// Unvalidated wire form of a point. Deserialization goes through
/// `TryFrom<RawPoint>` so a stored or received point is always in range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Construct a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, ValidationError> {
        if !longitude.is_finite()
            || !latitude.is_finite()
            || !(-180.0..=180.0).contains(&longitude)
            || !(-90.0..=90.0).contains(&latitude)
        {
            return Err(ValidationError::InvalidCoordinates { longitude, latitude });
        }
        Ok(Self { longitude, latitude })
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Great-circle distance to another point in meters (haversine).
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();

        // Rounding can nudge the haversine term past 1 for near-antipodal
        // points, which would put a NaN under the square root.
        let a = ((dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2))
        .min(1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.longitude, raw.latitude)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            longitude: point.longitude,
            latitude: point.latitude,
        }
    }
}

/// An issue's location: the indexed point plus the human-entered address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub point: GeoPoint,
    pub address: String,
}

impl GeoLocation {
    pub fn new(point: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            point,
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(77.2090, 28.6139).unwrap();
        assert_eq!(p.longitude(), 77.2090);
        assert_eq!(p.latitude(), 28.6139);
    }

    #[test]
    fn test_boundary_points_accepted() {
        assert!(GeoPoint::new(-180.0, -90.0).is_ok());
        assert!(GeoPoint::new(180.0, 90.0).is_ok());
        assert!(GeoPoint::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(GeoPoint::new(180.01, 0.0).is_err());
        assert!(GeoPoint::new(-181.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 90.5).is_err());
        assert!(GeoPoint::new(0.0, -91.0).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(f64::NEG_INFINITY, f64::NAN).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let ok: Result<GeoPoint, _> =
            serde_json::from_str(r#"{"longitude": 77.209, "latitude": 28.6139}"#);
        assert!(ok.is_ok());

        let bad: Result<GeoPoint, _> =
            serde_json::from_str(r#"{"longitude": 200.0, "latitude": 28.6139}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = GeoPoint::new(77.2090, 28.6139).unwrap();
        assert!(p.distance_meters(&p) < 1e-6);
    }

    #[test]
    fn test_known_distance_delhi() {
        // Connaught Place to India Gate is roughly 2km
        let cp = GeoPoint::new(77.2090, 28.6139).unwrap();
        let india_gate = GeoPoint::new(77.2295, 28.6129).unwrap();

        let d = cp.distance_meters(&india_gate);
        assert!(d > 1900.0 && d < 2150.0, "distance was {d}");
    }

    #[test]
    fn test_known_distance_long_haul() {
        // Delhi to Mumbai is about 1150km great-circle
        let delhi = GeoPoint::new(77.2090, 28.6139).unwrap();
        let mumbai = GeoPoint::new(72.8777, 19.0760).unwrap();

        let d = delhi.distance_meters(&mumbai);
        assert!(d > 1_100_000.0 && d < 1_200_000.0, "distance was {d}");
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            lng1 in -180.0f64..=180.0, lat1 in -90.0f64..=90.0,
            lng2 in -180.0f64..=180.0, lat2 in -90.0f64..=90.0,
        ) {
            let a = GeoPoint::new(lng1, lat1).unwrap();
            let b = GeoPoint::new(lng2, lat2).unwrap();
            let ab = a.distance_meters(&b);
            let ba = b.distance_meters(&a);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab >= 0.0);
        }

        #[test]
        fn prop_distance_bounded_by_half_circumference(
            lng1 in -180.0f64..=180.0, lat1 in -90.0f64..=90.0,
            lng2 in -180.0f64..=180.0, lat2 in -90.0f64..=90.0,
        ) {
            let a = GeoPoint::new(lng1, lat1).unwrap();
            let b = GeoPoint::new(lng2, lat2).unwrap();
            // No two points are farther apart than half the Earth's circumference
            prop_assert!(a.distance_meters(&b) <= std::f64::consts::PI * EARTH_RADIUS_METERS + 1.0);
        }
    }
}
