//! Geographic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// 2d point on the surface of the Earth, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude.
    pub const fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a point from longitude and latitude, the order GeoJSON uses.
    pub const fn lonlat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Converts a GeoJSON position (`[lon, lat, ...]`) into a point.
    pub fn try_from_position(position: &[f64]) -> Result<Self, FeatureError> {
        match position {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(Self::lonlat(*lon, *lat)),
            [_, _, ..] => Err(FeatureError::InvalidGeometry(
                "coordinates must be finite numbers".to_string(),
            )),
            _ => Err(FeatureError::InvalidGeometry(
                "point must contain at least 2 dimensions".to_string(),
            )),
        }
    }
}

/// Creates a new [`GeoPoint`] from latitude and longitude values (in degrees).
///
/// ```
/// use gandalf::latlon;
///
/// let point = latlon!(38.0, 52.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        $crate::geo::GeoPoint::latlon($lat, $lon)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_lon_lat() {
        let point = GeoPoint::try_from_position(&[-88.7, 31.0, 0.0]).unwrap();
        assert_eq!(point, latlon!(31.0, -88.7));
    }

    #[test]
    fn short_position_is_rejected() {
        assert!(GeoPoint::try_from_position(&[1.0]).is_err());
        assert!(GeoPoint::try_from_position(&[f64::NAN, 1.0]).is_err());
    }
}
