//! Window enumeration
//!
//! Partitions an inclusive calendar-date range into contiguous,
//! non-overlapping windows of one day or one hour, in increasing order.

use chrono::{DateTime, NaiveDate, Utc};

use super::error::ExportError;
use super::types::{Granularity, TimeRange, Window};

/// Date format accepted for `--start` and `--end`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate, ExportError> {
    // chrono skips whitespace ahead of numeric fields
    if s.chars().any(char::is_whitespace) {
        return Err(ExportError::InvalidDateFormat(s.to_string()));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ExportError::InvalidDateFormat(s.to_string()))
}

/// Lazy sequence of windows covering a date range
///
/// Cloning yields an independent cursor, so the sequence can be restarted.
#[derive(Debug, Clone)]
pub struct Windows {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity: Granularity,
}

impl Windows {
    fn empty(granularity: Granularity) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            cursor: epoch,
            end: epoch,
            granularity,
        }
    }
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.cursor >= self.end {
            return None;
        }
        let window = Window::starting_at(self.cursor, self.granularity);
        self.cursor = window.end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.cursor >= self.end {
            0
        } else {
            let span = (self.end - self.cursor).num_seconds();
            (span / self.granularity.step().num_seconds()) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows {}

impl std::iter::FusedIterator for Windows {}

/// Windows for the inclusive dates `[start_date, end_date]`
///
/// A reversed range (`start_date > end_date`) yields no windows.
pub fn windows(start_date: NaiveDate, end_date: NaiveDate, granularity: Granularity) -> Windows {
    match TimeRange::from_dates(start_date, end_date) {
        Some(range) => range.windows(granularity),
        None => Windows::empty(granularity),
    }
}

impl TimeRange {
    /// Subdivide this range into windows of the given granularity
    pub fn windows(&self, granularity: Granularity) -> Windows {
        Windows {
            cursor: self.start,
            end: self.end,
            granularity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2023-01-01").unwrap(), date(2023, 1, 1));
        assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));

        assert!(matches!(
            parse_date("2023-02-30"),
            Err(ExportError::InvalidDateFormat(_))
        ));
        assert!(matches!(
            parse_date("01/02/2023"),
            Err(ExportError::InvalidDateFormat(_))
        ));
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_date_rejects_surrounding_whitespace() {
        for input in [" 2023-01-01 ", " 2023-01-01", "2023-01-01\n", "2023- 01-01"] {
            assert!(
                matches!(parse_date(input), Err(ExportError::InvalidDateFormat(_))),
                "{input:?} accepted"
            );
        }
    }

    #[test]
    fn test_daily_windows() {
        let all: Vec<Window> = windows(date(2023, 1, 1), date(2023, 1, 3), Granularity::Daily).collect();

        assert_eq!(all.len(), 3);
        assert_eq!(all[0].start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(all[0].end, Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(all[2].end, Utc.with_ymd_and_hms(2023, 1, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_hourly_windows() {
        let all: Vec<Window> = windows(date(2023, 1, 1), date(2023, 1, 2), Granularity::Hourly).collect();

        assert_eq!(all.len(), 48);
        assert_eq!(all[5].start, Utc.with_ymd_and_hms(2023, 1, 1, 5, 0, 0).unwrap());
        assert_eq!(all[5].end, Utc.with_ymd_and_hms(2023, 1, 1, 6, 0, 0).unwrap());
        assert_eq!(all[24].start, Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(all[47].end, Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_windows_cover_range_without_gaps() {
        let start = date(2024, 2, 27);
        let end = date(2024, 3, 2);
        let range = TimeRange::from_dates(start, end).unwrap();

        for granularity in [Granularity::Daily, Granularity::Hourly] {
            let all: Vec<Window> = windows(start, end, granularity).collect();

            assert_eq!(all.len() as i64, range.days() * granularity.windows_per_day());
            assert_eq!(all.first().unwrap().start, range.start);
            assert_eq!(all.last().unwrap().end, range.end);
            for pair in all.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let mut iter = windows(date(2023, 1, 2), date(2023, 1, 1), Granularity::Hourly);
        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_single_day() {
        assert_eq!(windows(date(2023, 6, 1), date(2023, 6, 1), Granularity::Daily).count(), 1);
        assert_eq!(windows(date(2023, 6, 1), date(2023, 6, 1), Granularity::Hourly).count(), 24);
    }

    #[test]
    fn test_windows_restartable() {
        let iter = windows(date(2023, 1, 1), date(2023, 1, 1), Granularity::Hourly);
        let mut partial = iter.clone();
        partial.next();
        partial.next();

        assert_eq!(partial.len(), 22);
        assert_eq!(iter.len(), 24);
        assert_eq!(iter.clone().collect::<Vec<_>>(), iter.collect::<Vec<_>>());
    }
}
