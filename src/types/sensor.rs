//! Defines the data structures describing a configured air-quality sensor feed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The particulate sensor model recorded in every archive filename.
pub const SENSOR_TYPE: &str = "sds011";

/// Represents a single sensor feed published to the Luftdaten archive.
///
/// A `Sensor` is built once from configuration and never mutated afterwards.
/// [`Sensor::with_start_date`] returns a new value when a start date has been
/// discovered for a sensor that was configured without one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Sensor {
    /// The archive sensor code (e.g. "12345"), used verbatim in archive filenames.
    pub code: String,
    /// Human readable label for the sensor.
    pub name: String,
    /// The earliest date the archive holds data for this sensor, if known.
    pub start_date: Option<NaiveDate>,
    /// Where the sensor is installed.
    pub location: Location,
}

impl Sensor {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        start_date: Option<NaiveDate>,
        location: Location,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            start_date,
            location,
        }
    }

    /// Returns a copy of this sensor with its start date set to `start_date`.
    pub fn with_start_date(&self, start_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            ..self.clone()
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Represents the geographical location of a sensor.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
