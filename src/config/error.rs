use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse sensor config")]
    Parse(#[from] serde_yaml::Error),

    #[error("Expected some luftdaten sensors to be defined in config")]
    NoSensors,

    #[error("Sensor {0} is defined more than once")]
    DuplicateSensor(String),

    #[error("Sensor code '{0}' cannot be used in a file name")]
    InvalidCode(String),

    #[error("Sensor {0} has an empty name")]
    EmptyName(String),

    #[error("Sensor {code} has an invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        code: String,
        latitude: f64,
        longitude: f64,
    },
}
