// Geographic point representation and distance math
use error_common::{ReliefError, Result};
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Construct a point, rejecting out-of-range or non-finite coordinates
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    /// Check the coordinate ranges without constructing
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(ReliefError::validation("coordinates must be finite numbers"));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ReliefError::validation(format!(
                "latitude {} out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(ReliefError::validation(format!(
                "longitude {} out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Extended WKT form understood by PostGIS, longitude first
    pub fn to_ewkt(&self) -> String {
        format!("SRID=4326;POINT({} {})", self.lng, self.lat)
    }

    /// Great-circle distance to another point in meters (haversine)
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(45.0, 181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(40.7, -74.0).is_ok());
    }

    #[test]
    fn ewkt_is_longitude_first() {
        let p = GeoPoint { lat: 40.7, lng: -74.0 };
        assert_eq!(p.to_ewkt(), "SRID=4326;POINT(-74 40.7)");
    }

    #[test]
    fn haversine_distance_is_plausible() {
        // Manhattan to Brooklyn, roughly 8.5 km
        let a = GeoPoint { lat: 40.7580, lng: -73.9855 };
        let b = GeoPoint { lat: 40.6782, lng: -73.9442 };
        let d = a.distance_m(&b);
        assert!(d > 8_000.0 && d < 10_500.0, "distance was {d}");

        let zero = a.distance_m(&a);
        assert!(zero < 1.0e-6);
    }
}
