//! Maps a `(sensor code, date)` pair to its canonical file in the Luftdaten archive.
//!
//! The same identity is used to build download URLs, to place files in the
//! local mirror and to recognise files that have already been mirrored, so the
//! formatting here must stay byte-identical to the archive's own naming.

use crate::types::sensor::SENSOR_TYPE;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};

/// The public Luftdaten archive.
pub const DEFAULT_ARCHIVE_URL: &str = "http://archive.luftdaten.info";

const DATE_FORMAT: &str = "%Y-%m-%d";
const FILE_EXTENSION: &str = ".csv";

/// Whether `code` can be used verbatim as part of a mirror file name.
///
/// Codes must be non-empty, must not contain path separators and must not be `.` or `..`.
pub fn is_valid_sensor_code(code: &str) -> bool {
    !code.is_empty() && code != "." && code != ".." && !code.contains(['/', '\\'])
}

/// One day of data for one sensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveFile {
    pub date: NaiveDate,
    pub sensor_code: String,
}

impl ArchiveFile {
    pub fn new(sensor_code: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            date,
            sensor_code: sensor_code.into(),
        }
    }

    /// The `YYYY-MM-DD` directory the archive (and the mirror) files this day under.
    pub fn date_dir(&self) -> String {
        format!(
            "{}-{:02}-{:02}",
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }

    /// `{year}-{month:02}-{day:02}_sds011_sensor_{code}.csv`
    pub fn filename(&self) -> String {
        format!(
            "{}_{}_sensor_{}{}",
            self.date_dir(),
            SENSOR_TYPE,
            self.sensor_code,
            FILE_EXTENSION
        )
    }

    /// The download URL of this file below `archive_url`.
    pub fn url(&self, archive_url: &str) -> String {
        format!(
            "{}/{}/{}",
            archive_url.trim_end_matches('/'),
            self.date_dir(),
            self.filename()
        )
    }

    /// Where this file lives inside a mirror rooted at `mirror_dir`.
    pub fn local_path(&self, mirror_dir: &Path) -> PathBuf {
        mirror_dir.join(self.date_dir()).join(self.filename())
    }

    /// Parses an archive filename back into its identity.
    ///
    /// Only names that [`ArchiveFile::filename`] would produce are accepted, so
    /// temporary files and unrelated files in the mirror are never mistaken for
    /// mirrored data.
    pub fn parse_filename(filename: &str) -> Option<Self> {
        let stem = filename.strip_suffix(FILE_EXTENSION)?;
        let (date_part, rest) = stem.split_once('_')?;
        let sensor_code = rest
            .strip_prefix(SENSOR_TYPE)?
            .strip_prefix("_sensor_")?;
        if !is_valid_sensor_code(sensor_code) {
            return None;
        }
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
        let file = Self::new(sensor_code, date);

        // Rejects non-canonical spellings such as unpadded months.
        (file.filename() == filename).then_some(file)
    }
}

impl fmt::Display for ArchiveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filename() {
        let file = ArchiveFile::new("12345", date(2018, 1, 31));
        assert_eq!(file.filename(), "2018-01-31_sds011_sensor_12345.csv");
    }

    #[test]
    fn test_url() {
        let file = ArchiveFile::new("123", date(2017, 6, 1));
        assert_eq!(
            file.url(DEFAULT_ARCHIVE_URL),
            "http://archive.luftdaten.info/2017-06-01/2017-06-01_sds011_sensor_123.csv"
        );
        assert_eq!(
            file.url("http://localhost:8080/"),
            "http://localhost:8080/2017-06-01/2017-06-01_sds011_sensor_123.csv"
        );
    }

    #[test]
    fn test_local_path_is_nested_by_date() {
        let file = ArchiveFile::new("123", date(2017, 6, 1));
        let path = file.local_path(Path::new("/data/raw"));
        assert_eq!(
            path,
            Path::new("/data/raw/2017-06-01/2017-06-01_sds011_sensor_123.csv")
        );
    }

    #[test]
    fn test_filename_is_injective_over_dates() {
        let start = date(2015, 10, 1);
        let names: HashSet<String> = start
            .iter_days()
            .take(3 * 366)
            .map(|d| ArchiveFile::new("123", d).filename())
            .collect();
        assert_eq!(names.len(), 3 * 366);

        let again = ArchiveFile::new("123", start).filename();
        assert_eq!(again, ArchiveFile::new("123", start).filename());
    }

    #[test]
    fn test_parse_filename_accepts_what_it_writes() {
        let file = ArchiveFile::new("sensor_7", date(2019, 12, 5));
        assert_eq!(ArchiveFile::parse_filename(&file.filename()), Some(file));
    }

    #[test]
    fn test_parse_filename_rejects_foreign_names() {
        for name in [
            "2019-12-05_sds011_sensor_123.csv.tmp",
            "2019-12-05_bme280_sensor_123.csv",
            "2019-12-05_sds011_sensor_.csv",
            "2019-12-5_sds011_sensor_123.csv",
            "2019-13-05_sds011_sensor_123.csv",
            ".tmpAbC123",
            "notes.txt",
        ] {
            assert_eq!(ArchiveFile::parse_filename(name), None, "{name}");
        }
    }

    #[test]
    fn test_sensor_codes_must_be_path_safe() {
        assert!(is_valid_sensor_code("12345"));
        assert!(is_valid_sensor_code("ab-7.x"));
        for code in ["", ".", "..", "a/b", "../x", "a\\b"] {
            assert!(!is_valid_sensor_code(code), "{code}");
        }

        assert_eq!(
            ArchiveFile::parse_filename("2019-12-05_sds011_sensor_...csv"),
            None
        );
        assert_eq!(
            ArchiveFile::parse_filename("2019-12-05_sds011_sensor_a\\b.csv"),
            None
        );
    }
}
