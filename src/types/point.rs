//! Geographic coordinate type used to identify a weather query location.

use crate::error::CityTrendError;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64` degrees.
///
/// # Examples
///
/// ```
/// use citytrend::LatLon;
///
/// let guangzhou = LatLon(23.1291, 113.2644);
/// assert_eq!(guangzhou.0, 23.1291); // Latitude
/// assert_eq!(guangzhou.1, 113.2644); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Creates a `LatLon`, validating that latitude lies within `[-90, 90]`
    /// and longitude within `[-180, 180]`.
    ///
    /// The tuple constructor performs no validation; use this when the
    /// coordinate comes from external input such as a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::InvalidCoordinate`] if either component is
    /// out of bounds or not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use citytrend::LatLon;
    ///
    /// assert!(LatLon::new(52.52, 13.40).is_ok());
    /// assert!(LatLon::new(91.0, 0.0).is_err());
    /// assert!(LatLon::new(0.0, -180.5).is_err());
    /// ```
    pub fn new(lat: f64, lon: f64) -> Result<Self, CityTrendError> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
        if lat_ok && lon_ok {
            Ok(LatLon(lat, lon))
        } else {
            Err(CityTrendError::InvalidCoordinate { lat, lon })
        }
    }

    /// The latitude component, in degrees.
    pub fn latitude(&self) -> f64 {
        self.0
    }

    /// The longitude component, in degrees.
    pub fn longitude(&self) -> f64 {
        self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_coordinates() {
        let point = LatLon::new(39.9042, 116.4074).unwrap();
        assert_eq!(point.latitude(), 39.9042);
        assert_eq!(point.longitude(), 116.4074);
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(LatLon::new(90.0, 180.0).is_ok());
        assert!(LatLon::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(matches!(
            LatLon::new(90.001, 0.0),
            Err(CityTrendError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(matches!(
            LatLon::new(0.0, 180.001),
            Err(CityTrendError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_components() {
        assert!(LatLon::new(f64::NAN, 0.0).is_err());
        assert!(LatLon::new(0.0, f64::INFINITY).is_err());
    }
}
