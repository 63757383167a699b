//! Geographic coordinates.
//!
//! There is no "unset" sentinel: code that may not know where the user is
//! holds an `Option<Coordinates>`.

use freezer_core::LocationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Validated constructor
    pub fn new(lat: f64, lon: f64) -> Result<Self, LocationError> {
        let in_range = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        if in_range {
            Ok(Self { lat, lon })
        } else {
            Err(LocationError::InvalidCoordinates { lat, lon })
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}
