//! Day-offset <-> calendar-date mapping for the two-handle range slider.

use chrono::{Duration, NaiveDate};

use crate::window::DateWindow;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps the slider's integer domain `[0, total_days]` onto a date window.
///
/// Offsets are anchored at the window start. Out-of-range offsets and dates
/// map linearly past the bounds; the form is responsible for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderDateMapper {
    start: NaiveDate,
    total_days: i64,
}

impl SliderDateMapper {
    pub fn new(window: &DateWindow) -> Self {
        Self {
            start: window.start(),
            total_days: (window.end() - window.start()).num_days(),
        }
    }

    pub fn total_days(&self) -> i64 {
        self.total_days
    }

    pub fn date_to_offset(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }

    pub fn offset_to_date(&self, offset: i64) -> NaiveDate {
        Duration::try_days(offset)
            .and_then(|delta| self.start.checked_add_signed(delta))
            .unwrap_or(if offset < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
    }

    /// Offset of an ISO date string, `None` if it does not parse.
    pub fn offset_of(&self, value: &str) -> Option<i64> {
        parse_date(value).map(|d| self.date_to_offset(d))
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
