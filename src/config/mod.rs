//! Loads the sensor configuration file.
//!
//! ```yaml
//! sensors:
//!   luftdaten:
//!     12345:
//!       name: Kitchen window
//!       start_date: 2018-01-01
//!       location:
//!         latitude: 51.45
//!         longitude: -2.58
//! ```

pub mod error;

use crate::config::error::ConfigError;
use crate::types::archive_file::is_valid_sensor_code;
use crate::types::sensor::{Location, Sensor};
use chrono::NaiveDate;
use log::info;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Default location of the sensor configuration, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/sensors.yaml";

#[derive(Debug, Deserialize)]
struct RawConfig {
    sensors: RawSensors,
}

#[derive(Debug, Deserialize)]
struct RawSensors {
    #[serde(default)]
    luftdaten: HashMap<RawSensorCode, RawSensor>,
}

// Codes are usually written as bare YAML integers.
#[derive(Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
enum RawSensorCode {
    Number(u64),
    Text(String),
}

impl From<RawSensorCode> for String {
    fn from(code: RawSensorCode) -> Self {
        match code {
            RawSensorCode::Number(number) => number.to_string(),
            RawSensorCode::Text(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSensor {
    name: String,
    start_date: Option<NaiveDate>,
    location: Location,
}

/// Reads and validates the sensors defined in the config file at `path`.
pub fn load_sensors(path: &Path) -> Result<Vec<Sensor>, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let sensors = parse_sensors(&contents)?;
    info!(
        "Loaded {} luftdaten sensors from {}",
        sensors.len(),
        path.display()
    );
    Ok(sensors)
}

/// Parses and validates a sensor config document. Sensors are returned ordered by code.
pub fn parse_sensors(yaml: &str) -> Result<Vec<Sensor>, ConfigError> {
    let config: RawConfig = serde_yaml::from_str(yaml)?;

    let mut by_code = BTreeMap::new();
    for (code, raw) in config.sensors.luftdaten {
        let code = String::from(code);
        if !is_valid_sensor_code(&code) {
            return Err(ConfigError::InvalidCode(code));
        }
        if by_code.contains_key(&code) {
            return Err(ConfigError::DuplicateSensor(code));
        }
        by_code.insert(code, raw);
    }
    if by_code.is_empty() {
        return Err(ConfigError::NoSensors);
    }

    by_code
        .into_iter()
        .map(|(code, raw)| {
            if raw.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(code));
            }
            if !raw.location.is_valid() {
                return Err(ConfigError::InvalidLocation {
                    code,
                    latitude: raw.location.latitude,
                    longitude: raw.location.longitude,
                });
            }
            Ok(Sensor::new(code, raw.name, raw.start_date, raw.location))
        })
        .collect()
}
