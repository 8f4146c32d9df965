//! Discovers the first day the archive holds data for a sensor.
//!
//! The search samples a spread of dates across a window instead of checking every
//! day, then narrows to the gap between the last sampled day without data and the
//! first sampled day with data, until the boundary is pinned down. Because only
//! sampled days are checked, a sensor that reported intermittently can be given a
//! start date later than its true first reading.

use crate::archive::error::ArchiveError;
use crate::archive::oracle::{DateAvailabilityCache, ExistenceOracle};
use chrono::{Local, NaiveDate};
use log::info;
use std::collections::BTreeSet;
use std::iter;

/// The archive holds no data before this day.
pub const ARCHIVE_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2015, 10, 1) {
    Some(date) => date,
    None => panic!("archive epoch is not a valid date"),
};

/// Upper bound on the gap between two sampled dates.
const MAX_SAMPLE_SPACING_DAYS: i64 = 28;
/// Days before "today" sampled on the first pass, for sensors that only just came online.
const RECENT_DAYS: usize = 7;

/// An inclusive range of days being searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SearchWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ArchiveError> {
        if start > end {
            return Err(ArchiveError::InvalidWindow {
                earliest: start,
                latest: end,
            });
        }
        Ok(Self { start, end })
    }

    pub fn span_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days()
    }
}

/// What the sampled answers say about where the start date is.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Found(NaiveDate),
    Unknown,
    Narrow(SearchWindow),
}

/// Finds sensor start dates with as few existence checks as possible.
pub struct StartDateFinder<O> {
    oracle: O,
    today: Option<NaiveDate>,
}

impl<O: ExistenceOracle> StartDateFinder<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            today: None,
        }
    }

    /// Pins the date treated as "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Finds the first date with archived data for `sensor_code`.
    ///
    /// `earliest` defaults to [`ARCHIVE_EPOCH`] and `latest` to today. Returns
    /// `Ok(None)` when no sampled date in the window has data.
    ///
    /// # Errors
    ///
    /// * [`ArchiveError::InvalidWindow`] if `earliest` is after `latest`.
    /// * Any transport error from the oracle, unchanged. Discovery is aborted.
    /// * [`ArchiveError::SearchInvariant`] if the oracle's answers are contradictory.
    pub async fn find_start_date(
        &self,
        sensor_code: &str,
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
    ) -> Result<Option<NaiveDate>, ArchiveError> {
        let mut cache = DateAvailabilityCache::new();
        self.find_start_date_with_cache(sensor_code, earliest, latest, &mut cache)
            .await
    }

    /// Same as [`StartDateFinder::find_start_date`], reusing answers already in `cache`
    /// and recording every new one in it.
    pub async fn find_start_date_with_cache(
        &self,
        sensor_code: &str,
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
        cache: &mut DateAvailabilityCache,
    ) -> Result<Option<NaiveDate>, ArchiveError> {
        let today = self.today();
        let mut first_pass = earliest.is_none() && latest.is_none();
        let mut window = SearchWindow::new(
            earliest.unwrap_or(ARCHIVE_EPOCH),
            latest.unwrap_or(today),
        )?;

        loop {
            info!(
                "Searching sensor {} between {} and {}",
                sensor_code, window.start, window.end
            );
            let recent_until = first_pass.then_some(today);
            first_pass = false;

            let mut checked = Vec::new();
            for date in sample_dates(window, recent_until) {
                let has_data = cache.check(&self.oracle, sensor_code, date).await?;
                checked.push((date, has_data));
            }

            match next_step(sensor_code, window, &checked)? {
                Step::Found(date) => {
                    info!("Sensor {} has data from {}", sensor_code, date);
                    return Ok(Some(date));
                }
                Step::Unknown => {
                    info!(
                        "No data found for sensor {} between {} and {}",
                        sensor_code, window.start, window.end
                    );
                    return Ok(None);
                }
                Step::Narrow(next) => window = next,
            }
        }
    }
}

/// The dates to check for `window`, ascending.
///
/// Both endpoints are always included. Samples are spaced at most
/// [`MAX_SAMPLE_SPACING_DAYS`] apart, closer for small windows. When
/// `recent_until` is given the [`RECENT_DAYS`] days ending on it are added too.
pub fn sample_dates(window: SearchWindow, recent_until: Option<NaiveDate>) -> Vec<NaiveDate> {
    let span = window.span_days();
    let mut samples = BTreeSet::from([window.start, window.end]);

    if span > 1 {
        let spacing = (span / 3).clamp(1, MAX_SAMPLE_SPACING_DAYS) as usize;
        samples.extend(
            window
                .start
                .iter_days()
                .step_by(spacing)
                .take_while(|date| *date < window.end),
        );

        if let Some(today) = recent_until {
            samples.extend(
                iter::successors(Some(today), |date| date.pred_opt()).take(RECENT_DAYS),
            );
        }
    }

    samples.into_iter().collect()
}

fn next_step(
    sensor_code: &str,
    window: SearchWindow,
    checked: &[(NaiveDate, bool)],
) -> Result<Step, ArchiveError> {
    let invariant = |message: String| ArchiveError::SearchInvariant {
        sensor: sensor_code.to_string(),
        message,
    };

    if checked.contains(&(window.start, true)) {
        return Ok(Step::Found(window.start));
    }
    if !checked.iter().any(|(_, has_data)| *has_data) {
        return Ok(Step::Unknown);
    }
    // At least one checked date has data from here on.
    if let [(earlier, earlier_has_data), (later, _)] = checked {
        return Ok(Step::Found(if *earlier_has_data { *earlier } else { *later }));
    }

    let mut last_without_data = window.start;
    for (date, has_data) in checked {
        if *has_data {
            let next = SearchWindow::new(last_without_data, *date)?;
            if next.span_days() >= window.span_days() {
                return Err(invariant(format!(
                    "window {}..{} did not narrow",
                    next.start, next.end
                )));
            }
            return Ok(Step::Narrow(next));
        }
        last_without_data = *date;
    }

    Err(invariant(format!(
        "no date with data between {} and {}",
        window.start, window.end
    )))
}
