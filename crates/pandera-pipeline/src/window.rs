//! Default date windows per computation kind.
//!
//! Historical computations look back from today, forward-looking ones start
//! tomorrow. Unknown kinds take the forward-looking window.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use pandera_common::ComputationKind;
use serde::Serialize;

/// Closed calendar range `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Source of "today" for window derivation.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Current UTC calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Derive the default window for `kind` relative to `reference_now`.
pub fn derive_window(kind: &ComputationKind, reference_now: NaiveDate) -> DateWindow {
    let (start, end) = match kind {
        ComputationKind::OrderFlowCanyon => (
            shift_years(reference_now, -3),
            shift_days(reference_now, -2),
        ),
        ComputationKind::USFixedIncomeYield => (
            shift_years(reference_now, -5),
            shift_days(reference_now, -1),
        ),
        ComputationKind::IVMap | ComputationKind::Other(_) => (
            shift_days(reference_now, 1),
            shift_years(reference_now, 2),
        ),
    };
    DateWindow { start, end }
}

/// Calendar-year shift. 29 February lands on 1 March in non-leap years.
fn shift_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year().saturating_add(years);
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(if years < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_policy_table() {
        let now = d(2024, 6, 15);

        let w = derive_window(&ComputationKind::OrderFlowCanyon, now);
        assert_eq!((w.start(), w.end()), (d(2021, 6, 15), d(2024, 6, 13)));

        let w = derive_window(&ComputationKind::IVMap, now);
        assert_eq!((w.start(), w.end()), (d(2024, 6, 16), d(2026, 6, 15)));

        let w = derive_window(&ComputationKind::USFixedIncomeYield, now);
        assert_eq!((w.start(), w.end()), (d(2019, 6, 15), d(2024, 6, 14)));
    }

    #[test]
    fn test_unknown_kind_uses_forward_window() {
        let now = d(2024, 6, 15);
        let foo = derive_window(&ComputationKind::from("Foo"), now);
        assert_eq!(foo, derive_window(&ComputationKind::IVMap, now));
    }

    #[test]
    fn test_windows_are_monotonic() {
        let kinds = [
            ComputationKind::OrderFlowCanyon,
            ComputationKind::IVMap,
            ComputationKind::USFixedIncomeYield,
            ComputationKind::from("Unknown"),
        ];
        let mut now = d(2019, 1, 1);
        while now < d(2029, 1, 1) {
            for kind in &kinds {
                let w = derive_window(kind, now);
                assert!(w.start() <= w.end(), "{kind} at {now}: {w:?}");
            }
            now += Duration::days(13);
        }
    }

    #[test]
    fn test_leap_day_rolls_forward() {
        let now = d(2024, 2, 29);
        let w = derive_window(&ComputationKind::OrderFlowCanyon, now);
        assert_eq!(w.start(), d(2021, 3, 1));
        let w = derive_window(&ComputationKind::IVMap, now);
        assert_eq!(w.end(), d(2026, 3, 1));
    }

    #[test]
    fn test_window_new_rejects_inverted_range() {
        assert!(DateWindow::new(d(2024, 1, 2), d(2024, 1, 1)).is_none());
        let single = DateWindow::new(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(
            serde_json::to_value(single).unwrap(),
            serde_json::json!({"start": "2024-01-01", "end": "2024-01-01"})
        );
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(d(2024, 1, 1)).today(), d(2024, 1, 1));
    }
}
