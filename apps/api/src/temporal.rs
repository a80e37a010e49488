//! Date normalization and window filtering for store-sourced rows.
//!
//! The tabular store returns dates in three shapes: ISO strings
//! ("2024-01-15" or "2024-01-15T10:00:00"), spreadsheet serial numbers
//! (integer days since 1899-12-30), and missing/sentinel values. When a
//! window bound is configured the filter is strict: a row whose date is
//! missing or unparseable is excluded, never included.

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::errors::AppError;

/// Spreadsheet serial date epoch.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Parses a raw cell value into a calendar date.
///
/// Accepts ISO dates, ISO datetimes (date component only), and integer
/// serial values. Returns `None` for empty, sentinel, or unparseable input.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "N/A" {
        return None;
    }

    // Serial number (store may render dates as day offsets)
    if let Ok(serial) = raw.parse::<i64>() {
        let epoch = NaiveDate::from_ymd_opt(SERIAL_EPOCH.0, SERIAL_EPOCH.1, SERIAL_EPOCH.2)?;
        return epoch.checked_add_signed(Duration::days(serial));
    }

    // ISO string; keep only the date component of a datetime
    let date_part = raw
        .split(['T', ' '])
        .next()
        .unwrap_or(raw)
        .trim();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// An inclusive date window. Unset bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Strict acceptance test: with any bound configured, a missing or
    /// unparseable date excludes the row (fail-closed). Both bounds are
    /// inclusive.
    pub fn accepts(&self, raw: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let date = match parse_sheet_date(raw) {
            Some(d) => d,
            None => return false,
        };
        if let Some(min) = self.min {
            if date < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if date > max {
                return false;
            }
        }
        true
    }
}

/// Time-period presets accepted by the import and sync endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "LAST_7_DAYS")]
    Last7Days,
    #[serde(rename = "LAST_30_DAYS")]
    Last30Days,
    #[serde(rename = "CUSTOM")]
    Custom,
}

impl Default for TimePeriod {
    fn default() -> Self {
        TimePeriod::All
    }
}

/// Resolves a period plus optional explicit dates into a window, anchored
/// at `today` so callers (and tests) control the clock.
pub fn window_for(
    period: TimePeriod,
    start_date: Option<&str>,
    end_date: Option<&str>,
    today: NaiveDate,
) -> Result<DateWindow, AppError> {
    let parse_bound = |label: &str, raw: &str| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::Validation(format!("Invalid {label} format. Use YYYY-MM-DD"))
        })
    };

    match period {
        TimePeriod::All => Ok(DateWindow::unbounded()),
        TimePeriod::Last7Days => Ok(DateWindow {
            min: Some(today - Duration::days(7)),
            max: Some(today),
        }),
        TimePeriod::Last30Days => Ok(DateWindow {
            min: Some(today - Duration::days(30)),
            max: Some(today),
        }),
        TimePeriod::Custom => {
            let min = match start_date {
                Some(s) if !s.trim().is_empty() => Some(parse_bound("start_date", s)?),
                _ => None,
            };
            let max = match end_date {
                Some(s) if !s.trim().is_empty() => Some(parse_bound("end_date", s)?),
                _ => None,
            };
            Ok(DateWindow { min, max })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_serial_45000_is_2023_03_15() {
        assert_eq!(parse_sheet_date("45000"), Some(d(2023, 3, 15)));
    }

    #[test]
    fn test_iso_date_parses() {
        assert_eq!(parse_sheet_date("2024-01-15"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn test_iso_datetime_takes_date_component() {
        assert_eq!(
            parse_sheet_date("2024-01-15T10:30:00"),
            Some(d(2024, 1, 15))
        );
        assert_eq!(
            parse_sheet_date("2024-01-15 10:30:00"),
            Some(d(2024, 1, 15))
        );
    }

    #[test]
    fn test_missing_and_sentinel_are_none() {
        assert_eq!(parse_sheet_date(""), None);
        assert_eq!(parse_sheet_date("  "), None);
        assert_eq!(parse_sheet_date("N/A"), None);
        assert_eq!(parse_sheet_date("not a date"), None);
    }

    #[test]
    fn test_unbounded_accepts_anything() {
        let w = DateWindow::unbounded();
        assert!(w.accepts(""));
        assert!(w.accepts("garbage"));
        assert!(w.accepts("2024-01-15"));
    }

    #[test]
    fn test_bounded_rejects_empty_date() {
        let w = DateWindow {
            min: Some(d(2024, 1, 1)),
            max: None,
        };
        assert!(!w.accepts(""));
        assert!(!w.accepts("N/A"));
        assert!(!w.accepts("12/31/2023"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let w = DateWindow {
            min: Some(d(2024, 1, 10)),
            max: Some(d(2024, 1, 20)),
        };
        assert!(w.accepts("2024-01-10"));
        assert!(w.accepts("2024-01-20"));
        assert!(!w.accepts("2024-01-09"));
        assert!(!w.accepts("2024-01-21"));
    }

    #[test]
    fn test_serial_date_filters_like_iso() {
        let w = DateWindow {
            min: Some(d(2023, 3, 15)),
            max: None,
        };
        assert!(w.accepts("45000")); // exactly the lower bound
        assert!(!w.accepts("44999"));
    }

    #[test]
    fn test_window_for_presets() {
        let today = d(2024, 6, 15);
        let w = window_for(TimePeriod::Last7Days, None, None, today).unwrap();
        assert_eq!(w.min, Some(d(2024, 6, 8)));
        assert_eq!(w.max, Some(today));

        let w = window_for(TimePeriod::Last30Days, None, None, today).unwrap();
        assert_eq!(w.min, Some(d(2024, 5, 16)));

        let w = window_for(TimePeriod::All, None, None, today).unwrap();
        assert!(w.is_unbounded());
    }

    #[test]
    fn test_window_for_custom_validates_format() {
        let today = d(2024, 6, 15);
        let w = window_for(
            TimePeriod::Custom,
            Some("2024-01-01"),
            Some("2024-02-01"),
            today,
        )
        .unwrap();
        assert_eq!(w.min, Some(d(2024, 1, 1)));
        assert_eq!(w.max, Some(d(2024, 2, 1)));

        assert!(window_for(TimePeriod::Custom, Some("01/01/2024"), None, today).is_err());
    }
}
