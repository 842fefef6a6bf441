//! Great-circle distance between geographic coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.009;

/// Kilometres in one statute mile.
pub const KM_PER_MILE: f64 = 1.609344;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Distance to `other` in statute miles.
    pub fn miles_to(&self, other: &Coordinates) -> f64 {
        great_circle_miles(*self, *other)
    }
}

/// Renders the stored `"<lat>,<lon>"` form.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses the stored `"<lat>,<lon>"` form. Whitespace around either number is
/// tolerated; anything else (missing separator, extra fields, non-finite
/// values) is a [`Error::MalformedLocation`].
impl FromStr for Coordinates {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedLocation {
            value: value.to_string(),
        };

        let mut parts = value.split(',');
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };

        let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| malformed())?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(malformed());
        }

        Ok(Self::new(latitude, longitude))
    }
}

/// Great-circle distance in statute miles between `a` and `b`.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
pub fn great_circle_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_KM * central_angle / KM_PER_MILE
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: Coordinates = Coordinates::new(51.5074, -0.1278);
    const EDINBURGH: Coordinates = Coordinates::new(55.9533, -3.1883);

    #[test]
    fn zero_distance_to_self() {
        assert_eq!(great_circle_miles(LONDON, LONDON), 0.0);
    }

    #[test]
    fn london_to_edinburgh_is_about_332_miles() {
        let miles = great_circle_miles(LONDON, EDINBURGH);
        assert!((miles - 332.0).abs() < 2.0, "got {miles}");
    }

    #[test]
    fn distance_is_symmetric() {
        let there = great_circle_miles(LONDON, EDINBURGH);
        let back = great_circle_miles(EDINBURGH, LONDON);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let miles = great_circle_miles(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        let expected = std::f64::consts::PI * EARTH_RADIUS_KM / KM_PER_MILE;
        assert!((miles - expected).abs() < 1e-6);
    }

    #[test]
    fn parses_stored_location() {
        let coords: Coordinates = "51.5074,-0.1278".parse().unwrap();
        assert_eq!(coords, LONDON);

        let spaced: Coordinates = " 55.9533 , -3.1883 ".parse().unwrap();
        assert_eq!(spaced, EDINBURGH);
    }

    #[test]
    fn rejects_malformed_location() {
        for value in ["", "51.5", "51.5,", "a,b", "1,2,3", "NaN,0", "inf,0"] {
            let err = value.parse::<Coordinates>().unwrap_err();
            assert!(
                matches!(err, Error::MalformedLocation { .. }),
                "{value:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let text = LONDON.to_string();
        assert_eq!(text, "51.5074,-0.1278");
        assert_eq!(text.parse::<Coordinates>().unwrap(), LONDON);
    }

    #[test]
    fn validity_checks_degree_ranges() {
        assert!(LONDON.is_valid());
        assert!(Coordinates::new(90.0, 180.0).is_valid());
        assert!(!Coordinates::new(90.1, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }
}
