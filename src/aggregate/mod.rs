//! Turns the mirrored raw files into per-month aggregate CSVs and a JSON summary.

pub mod error;
pub mod loader;
pub mod means;
pub mod summary;

use crate::aggregate::error::AggregateError;
use crate::aggregate::loader::{filter_month, load_sensor_frame, month_keys, MONTH, YEAR};
use crate::aggregate::means::{rolling_24_hour_means, weekday_by_hour_means};
use crate::aggregate::summary::{
    AvailableDates, MonthEntry, ProcessingSummary, SensorSummary, SUMMARY_FILE_NAME,
};
use crate::archive::mirror::scan_mirror;
use crate::types::sensor::{Sensor, SENSOR_TYPE};
use crate::utils::{aggregated_dir, raw_dir, AGGREGATED_DIR_NAME, LUFTDATEN_DIR_NAME};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

const ROLLING_MEANS_DIR: &str = "24_hour_means";
const WEEKDAY_BY_HOUR_DIR: &str = "weekday_by_hour";

/// Builds the aggregated outputs below `<data_dir>/luftdaten/aggregated`.
pub struct Aggregator {
    data_dir: PathBuf,
}

impl Aggregator {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn summary_path(&self) -> PathBuf {
        aggregated_dir(&self.data_dir).join(SUMMARY_FILE_NAME)
    }

    /// Regenerates every aggregate for `sensors` and writes the summary file.
    ///
    /// Output from earlier runs is removed first. Sensors without mirrored files are
    /// skipped and left out of the summary.
    pub async fn process(&self, sensors: &[Sensor]) -> Result<ProcessingSummary, AggregateError> {
        let output_dir = aggregated_dir(&self.data_dir);
        clear_dir(&output_dir).await?;

        let mirror_dir = raw_dir(&self.data_dir);
        let mut summary = ProcessingSummary::default();
        for sensor in sensors {
            let files = scan_mirror(&mirror_dir, &sensor.code).await?;
            if files.is_empty() {
                warn!("No mirrored files for sensor {}, skipping", sensor);
                continue;
            }
            info!("Aggregating {} files for sensor {}", files.len(), sensor);

            let paths = files
                .iter()
                .map(|file| file.local_path(&mirror_dir))
                .collect::<Vec<_>>();
            let sensor = sensor.clone();
            let output_dir = output_dir.clone();
            let sensor_summary =
                task::spawn_blocking(move || aggregate_sensor(&sensor, &paths, &output_dir))
                    .await??;
            summary.luftdaten_sensors.push(sensor_summary);
        }

        let summary_path = self.summary_path();
        let encoded = serde_json::to_vec_pretty(&summary)?;
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| AggregateError::WriteIo(output_dir.clone(), e))?;
        fs::write(&summary_path, encoded)
            .await
            .map_err(|e| AggregateError::WriteIo(summary_path.clone(), e))?;
        info!("Wrote sensor summary to {}", summary_path.display());
        Ok(summary)
    }
}

async fn clear_dir(dir: &Path) -> Result<(), AggregateError> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AggregateError::ClearOutput(dir.to_path_buf(), e)),
    }
}

fn aggregate_sensor(
    sensor: &Sensor,
    paths: &[PathBuf],
    output_dir: &Path,
) -> Result<SensorSummary, AggregateError> {
    let raw = load_sensor_frame(&sensor.code, paths)?;
    let keys = month_keys(&raw)?;
    let rolling = rolling_24_hour_means(raw.clone().lazy()).collect()?;

    let mut twenty_four_hour_means = AvailableDates::default();
    let mut day_of_week = AvailableDates::default();
    for (year, month) in keys {
        let file_name = output_file_name(year, month, &sensor.code, "24_hour_means");
        let mut frame = filter_month(rolling.clone().lazy(), year, month).collect()?;
        write_csv(&mut frame, &output_dir.join(ROLLING_MEANS_DIR).join(&file_name))?;
        twenty_four_hour_means.push(
            year,
            MonthEntry::new(month, relative_path(ROLLING_MEANS_DIR, &file_name))?,
        );

        let file_name = output_file_name(year, month, &sensor.code, "by_weekday_by_hour");
        let mut frame = weekday_by_hour_means(filter_month(raw.clone().lazy(), year, month))
            .with_columns([
                lit(year).alias(YEAR),
                lit(month as i32).alias(MONTH),
            ])
            .collect()?;
        write_csv(
            &mut frame,
            &output_dir.join(WEEKDAY_BY_HOUR_DIR).join(&file_name),
        )?;
        day_of_week.push(
            year,
            MonthEntry::new(month, relative_path(WEEKDAY_BY_HOUR_DIR, &file_name))?,
        );
    }

    Ok(SensorSummary {
        code: sensor.code.clone(),
        name: sensor.name.clone(),
        twenty_four_hour_means,
        day_of_week,
    })
}

fn output_file_name(year: i32, month: u32, sensor_code: &str, kind: &str) -> String {
    format!(
        "{}_{:02}_{}_sensor_{}_{}.csv",
        year, month, SENSOR_TYPE, sensor_code, kind
    )
}

// Summary paths always use forward slashes so the JSON is platform independent.
fn relative_path(kind_dir: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        LUFTDATEN_DIR_NAME, AGGREGATED_DIR_NAME, kind_dir, file_name
    )
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), AggregateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AggregateError::WriteIo(parent.to_path_buf(), e))?;
    }
    let file =
        std::fs::File::create(path).map_err(|e| AggregateError::WriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)
        .map_err(|e| AggregateError::CsvWrite(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::archive_file::ArchiveFile;
    use crate::types::sensor::Location;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn mirror_day(data_dir: &Path, code: &str, date: NaiveDate, hourly_value: f64) {
        let file = ArchiveFile::new(code, date);
        let path = file.local_path(&raw_dir(data_dir));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut contents = String::from("sensor_id;timestamp;P1;P2\n");
        for hour in 0..24 {
            contents.push_str(&format!(
                "{};{}T{:02}:00:00;{};{}\n",
                code,
                file.date_dir(),
                hour,
                hourly_value,
                hourly_value / 2.0
            ));
        }
        std::fs::write(path, contents).unwrap();
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sensor(code: &str) -> Sensor {
        Sensor::new(code, format!("Sensor {}", code), None, Location::new(0.0, 0.0))
    }

    #[tokio::test]
    async fn test_process_writes_monthly_files_and_summary() -> Result<(), AggregateError> {
        let tmp = TempDir::new().unwrap();
        mirror_day(tmp.path(), "123", date(2018, 1, 31), 10.0);
        mirror_day(tmp.path(), "123", date(2018, 2, 1), 20.0);
        mirror_day(tmp.path(), "123", date(2019, 3, 4), 30.0);

        let aggregator = Aggregator::new(tmp.path());
        let summary = aggregator.process(&[sensor("123")]).await?;

        assert_eq!(summary.luftdaten_sensors.len(), 1);
        let sensor_summary = &summary.luftdaten_sensors[0];
        assert_eq!(sensor_summary.code, "123");
        assert_eq!(sensor_summary.name, "Sensor 123");

        let years = &sensor_summary.twenty_four_hour_means.available_dates;
        assert_eq!(years.keys().copied().collect::<Vec<_>>(), vec![2018, 2019]);
        assert_eq!(
            years[&2018]
                .iter()
                .map(|entry| entry.month_name.as_str())
                .collect::<Vec<_>>(),
            vec!["January", "February"]
        );
        assert_eq!(
            years[&2019][0].path,
            "luftdaten/aggregated/24_hour_means/2019_03_sds011_sensor_123_24_hour_means.csv"
        );
        assert_eq!(
            sensor_summary.day_of_week.available_dates[&2018][1].path,
            "luftdaten/aggregated/weekday_by_hour/2018_02_sds011_sensor_123_by_weekday_by_hour.csv"
        );

        for entry in sensor_summary
            .twenty_four_hour_means
            .available_dates
            .values()
            .chain(sensor_summary.day_of_week.available_dates.values())
            .flatten()
        {
            assert!(tmp.path().join(&entry.path).is_file(), "{}", entry.path);
        }

        let written: ProcessingSummary =
            serde_json::from_slice(&std::fs::read(aggregator.summary_path()).unwrap())?;
        assert_eq!(written, summary);
        Ok(())
    }

    #[tokio::test]
    async fn test_rolling_means_cross_month_boundary() -> Result<(), AggregateError> {
        let tmp = TempDir::new().unwrap();
        mirror_day(tmp.path(), "123", date(2018, 1, 31), 10.0);
        mirror_day(tmp.path(), "123", date(2018, 2, 1), 20.0);

        let aggregator = Aggregator::new(tmp.path());
        let summary = aggregator.process(&[sensor("123")]).await?;
        let february = &summary.luftdaten_sensors[0]
            .twenty_four_hour_means
            .available_dates[&2018][1];

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(tmp.path().join(&february.path)))?
            .finish()?;
        assert_eq!(df.height(), 24);
        assert_eq!(
            df.get_column_names_str(),
            vec!["timestamp", "P1", "P2", "year", "month"]
        );
        // The first February reading still averages the last 23 January hours.
        let p1 = df.column("P1")?.f64()?;
        let expected = (23.0 * 10.0 + 20.0) / 24.0;
        assert!((p1.get(0).unwrap() - expected).abs() < 1e-9);
        assert_eq!(p1.get(23), Some(20.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_weekday_file_carries_year_and_month() -> Result<(), AggregateError> {
        let tmp = TempDir::new().unwrap();
        // 2018-10-01 was a Monday.
        mirror_day(tmp.path(), "9", date(2018, 10, 1), 4.0);

        let summary = Aggregator::new(tmp.path()).process(&[sensor("9")]).await?;
        let entry = &summary.luftdaten_sensors[0].day_of_week.available_dates[&2018][0];

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(tmp.path().join(&entry.path)))?
            .finish()?;
        assert_eq!(df.height(), 24);
        assert_eq!(
            df.get_column_names_str(),
            vec!["dayOfWeek", "hourOfDay", "P1", "P2", "year", "month"]
        );
        assert_eq!(df.column("dayOfWeek")?.str()?.get(0), Some("Monday"));
        assert_eq!(df.column("year")?.i64()?.get(0), Some(2018));
        assert_eq!(df.column("month")?.i64()?.get(0), Some(10));
        assert_eq!(df.column("P2")?.f64()?.get(5), Some(2.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_sensor_without_files_is_skipped() -> Result<(), AggregateError> {
        let tmp = TempDir::new().unwrap();
        mirror_day(tmp.path(), "1", date(2020, 5, 5), 1.0);

        let summary = Aggregator::new(tmp.path())
            .process(&[sensor("1"), sensor("2")])
            .await?;

        let codes = summary
            .luftdaten_sensors
            .iter()
            .map(|s| s.code.as_str())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["1"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_previous_output_is_cleared() -> Result<(), AggregateError> {
        let tmp = TempDir::new().unwrap();
        let stale = aggregated_dir(tmp.path()).join(ROLLING_MEANS_DIR).join("stale.csv");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let summary = Aggregator::new(tmp.path()).process(&[sensor("1")]).await?;

        assert!(summary.luftdaten_sensors.is_empty());
        assert!(!stale.exists());
        assert!(aggregated_dir(tmp.path()).join(SUMMARY_FILE_NAME).is_file());
        Ok(())
    }
}
