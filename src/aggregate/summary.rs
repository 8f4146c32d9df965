//! The `sensor-summary.json` index describing which aggregated months exist.

use crate::aggregate::error::AggregateError;
use chrono::Month;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SUMMARY_FILE_NAME: &str = "sensor-summary.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub luftdaten_sensors: Vec<SensorSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub code: String,
    pub name: String,
    #[serde(rename = "24_hour_means")]
    pub twenty_four_hour_means: AvailableDates,
    pub day_of_week: AvailableDates,
}

/// Aggregated files per year, keyed by year and ordered by month within a year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableDates {
    pub available_dates: BTreeMap<i32, Vec<MonthEntry>>,
}

impl AvailableDates {
    pub fn push(&mut self, year: i32, entry: MonthEntry) {
        self.available_dates.entry(year).or_default().push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.available_dates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthEntry {
    pub month: u32,
    pub month_name: String,
    /// Location of the aggregated file, relative to the data directory.
    pub path: String,
}

impl MonthEntry {
    pub fn new(month: u32, path: impl Into<String>) -> Result<Self, AggregateError> {
        let name = u8::try_from(month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or(AggregateError::InvalidGroupKey {
                year: None,
                month: i32::try_from(month).ok(),
            })?
            .name();
        Ok(Self {
            month,
            month_name: name.to_string(),
            path: path.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_month_entry_names() -> Result<(), AggregateError> {
        assert_eq!(MonthEntry::new(1, "a")?.month_name, "January");
        assert_eq!(MonthEntry::new(12, "a")?.month_name, "December");
        assert!(MonthEntry::new(0, "a").is_err());
        assert!(MonthEntry::new(13, "a").is_err());
        Ok(())
    }

    #[test]
    fn test_summary_json_shape() -> Result<(), AggregateError> {
        let mut means = AvailableDates::default();
        assert!(means.is_empty());
        means.push(2018, MonthEntry::new(2, "luftdaten/aggregated/x.csv")?);
        assert!(!means.is_empty());
        let summary = ProcessingSummary {
            luftdaten_sensors: vec![SensorSummary {
                code: "123".to_string(),
                name: "Garden".to_string(),
                twenty_four_hour_means: means.clone(),
                day_of_week: means,
            }],
        };

        let entry = json!({
            "2018": [{
                "month": 2,
                "month_name": "February",
                "path": "luftdaten/aggregated/x.csv"
            }]
        });
        assert_eq!(
            serde_json::to_value(&summary)?,
            json!({
                "luftdaten_sensors": [{
                    "code": "123",
                    "name": "Garden",
                    "24_hour_means": { "available_dates": entry.clone() },
                    "day_of_week": { "available_dates": entry }
                }]
            })
        );
        Ok(())
    }
}
