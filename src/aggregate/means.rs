//! Lazy aggregations over a loaded sensor frame.

use crate::aggregate::loader::{TIMESTAMP, VALUE_COLUMNS};
use polars::prelude::*;

pub const DAY_OF_WEEK: &str = "dayOfWeek";
pub const HOUR_OF_DAY: &str = "hourOfDay";

const WEEKDAY_INDEX: &str = "weekdayIndex";
const ROLLING_WINDOW: &str = "24h";

/// Replaces each value column with its mean over the trailing 24 hours.
///
/// The window for a row at `t` covers `(t - 24h, t]`, so a reading exactly one day
/// older is excluded. Rows are sorted by timestamp first; all other columns are kept.
pub fn rolling_24_hour_means(frame: LazyFrame) -> LazyFrame {
    let options = RollingOptionsDynamicWindow {
        window_size: Duration::parse(ROLLING_WINDOW),
        min_periods: 1,
        closed_window: ClosedWindow::Right,
        fn_params: None,
    };
    let means = VALUE_COLUMNS
        .iter()
        .map(|name| col(*name).rolling_mean_by(col(TIMESTAMP), options.clone()))
        .collect::<Vec<_>>();

    frame
        .sort([TIMESTAMP], SortMultipleOptions::default())
        .with_columns(means)
}

/// Mean of each value column per weekday and hour of day.
///
/// Produces `dayOfWeek` (English weekday name) and `hourOfDay` (0-23) followed by the
/// value columns, one row per combination present, Monday first then by hour.
pub fn weekday_by_hour_means(frame: LazyFrame) -> LazyFrame {
    let means = VALUE_COLUMNS
        .iter()
        .map(|name| col(*name).mean())
        .collect::<Vec<_>>();
    let mut output = vec![col(DAY_OF_WEEK), col(HOUR_OF_DAY)];
    output.extend(VALUE_COLUMNS.iter().map(|name| col(*name)));

    frame
        .group_by([
            col(TIMESTAMP)
                .dt()
                .weekday()
                .cast(DataType::Int32)
                .alias(WEEKDAY_INDEX),
            col(TIMESTAMP).dt().to_string("%A").alias(DAY_OF_WEEK),
            col(TIMESTAMP)
                .dt()
                .hour()
                .cast(DataType::Int32)
                .alias(HOUR_OF_DAY),
        ])
        .agg(means)
        .sort([WEEKDAY_INDEX, HOUR_OF_DAY], SortMultipleOptions::default())
        .select(output)
}
