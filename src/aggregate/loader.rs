//! Reads mirrored raw CSV files into a single polars frame.

use crate::aggregate::error::AggregateError;
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub const TIMESTAMP: &str = "timestamp";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
/// Particulate readings (PM10 and PM2.5) averaged by every aggregation.
pub const VALUE_COLUMNS: [&str; 2] = ["P1", "P2"];

const RAW_SEPARATOR: u8 = b';';
const RAW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Loads every file in `paths` into one frame with `timestamp`, `P1`, `P2`,
/// `year` and `month` columns.
///
/// Year and month are derived here, once, as `Int32` so every later grouping works
/// on integral keys. Rows whose timestamp is missing reject the whole load.
pub fn load_sensor_frame(sensor_code: &str, paths: &[PathBuf]) -> Result<DataFrame, AggregateError> {
    let frames = paths
        .iter()
        .map(|path| read_raw_csv(path))
        .collect::<Result<Vec<_>, _>>()?;

    let df = concat(frames, UnionArgs::default())?
        .with_columns([
            col(TIMESTAMP).dt().year().cast(DataType::Int32).alias(YEAR),
            col(TIMESTAMP).dt().month().cast(DataType::Int32).alias(MONTH),
        ])
        .collect()?;

    let null_rows = df.column(TIMESTAMP)?.null_count();
    if null_rows > 0 {
        return Err(AggregateError::NullTimestamps {
            sensor: sensor_code.to_string(),
            rows: null_rows,
        });
    }
    Ok(df)
}

fn read_raw_csv(path: &Path) -> Result<LazyFrame, AggregateError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_separator(RAW_SEPARATOR))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| AggregateError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| AggregateError::CsvRead(path.to_path_buf(), e))?;

    for column in std::iter::once(TIMESTAMP).chain(VALUE_COLUMNS) {
        if df.column(column).is_err() {
            return Err(AggregateError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    // Only the columns we aggregate are kept, so files whose other columns were
    // inferred with different types still stack.
    let timestamp = col(TIMESTAMP)
        .cast(DataType::String)
        .str()
        .strptime(
            DataType::Datetime(TimeUnit::Milliseconds, None),
            StrptimeOptions {
                format: Some(RAW_TIMESTAMP_FORMAT.into()),
                strict: true,
                ..Default::default()
            },
            lit("raise"),
        )
        .alias(TIMESTAMP);
    let mut columns = vec![timestamp];
    columns.extend(
        VALUE_COLUMNS
            .iter()
            .map(|name| col(*name).cast(DataType::Float64)),
    );
    Ok(df.lazy().select(columns))
}

/// Distinct `(year, month)` pairs present in `df`, in ascending order.
pub fn month_keys(df: &DataFrame) -> Result<Vec<(i32, u32)>, AggregateError> {
    let keys = df
        .clone()
        .lazy()
        .select([col(YEAR), col(MONTH)])
        .unique_stable(None, UniqueKeepStrategy::First)
        .sort([YEAR, MONTH], SortMultipleOptions::default())
        .collect()?;

    let years = keys.column(YEAR)?.i32()?;
    let months = keys.column(MONTH)?.i32()?;
    years
        .into_iter()
        .zip(months.into_iter())
        .map(|key| match key {
            (Some(year), Some(month)) if (1..=12).contains(&month) => Ok((year, month as u32)),
            (year, month) => Err(AggregateError::InvalidGroupKey { year, month }),
        })
        .collect()
}

/// Rows of `frame` falling in the given calendar month.
pub fn filter_month(frame: LazyFrame, year: i32, month: u32) -> LazyFrame {
    frame.filter(
        col(YEAR)
            .eq(lit(year))
            .and(col(MONTH).eq(lit(month as i32))),
    )
}
