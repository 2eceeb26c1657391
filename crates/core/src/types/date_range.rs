//! Show date filtering.
//!
//! Filtering happens at the show level and looks at `showDate` only; a
//! multi-day show is kept or dropped by its first day.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::show::Show;

/// Errors that can occur when building a date range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    /// The end bound does not come after the start bound.
    #[error("Invalid date range: end {end} must be after start {start}")]
    EndBeforeStart {
        /// Inclusive start.
        start: NaiveDate,
        /// Exclusive end.
        end: NaiveDate,
    },
}

/// A half-open date range `[start, end)`.
///
/// `end` is optional; without it every date on or after `start` matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// Create a range with an inclusive start and an exclusive end.
    ///
    /// # Errors
    ///
    /// Returns `DateRangeError::EndBeforeStart` if `end <= start`.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, DateRangeError> {
        if let Some(end) = end
            && end <= start
        {
            return Err(DateRangeError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Every date on or after `start`.
    #[must_use]
    pub const fn starting(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// `days` days starting at `start` (e.g. the next 365 days).
    ///
    /// A zero-day window is widened to one day.
    #[must_use]
    pub fn days_from(start: NaiveDate, days: u32) -> Self {
        let days = i64::from(days.max(1));
        Self {
            start,
            end: start.checked_add_signed(Duration::days(days)),
        }
    }

    /// Inclusive start.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end, if bounded.
    #[must_use]
    pub const fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Last day inside the range, if bounded.
    #[must_use]
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.end.and_then(|end| end.pred_opt())
    }

    /// Whether `date` falls within `[start, end)`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date < end)
    }

    /// Whether a show passes the filter. Shows without a date never do.
    #[must_use]
    pub fn admits(&self, show: &Show) -> bool {
        show.show_date.is_some_and(|date| self.contains(date))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}..{end}", self.start),
            None => write!(f, "{}..", self.start),
        }
    }
}
