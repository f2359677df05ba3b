//! ISO week bookkeeping.
//!
//! Week adjacency is decided on the Monday each ISO week starts on, so the
//! last week of one ISO year and week 1 of the next count as consecutive.

use chrono::{Datelike, Duration, IsoWeek, NaiveDate};
use serde::{Deserialize, Serialize};

/// The ISO week a date falls in, together with that week's Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IsoWeekStamp {
    monday: NaiveDate,
    year: i32,
    week: u32,
}

impl IsoWeekStamp {
    pub fn of(date: NaiveDate) -> Self {
        let iso: IsoWeek = date.iso_week();
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        Self {
            monday,
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// ISO week-numbering year (may differ from the calendar year around New Year).
    pub fn year(&self) -> i32 {
        self.year
    }

    /// ISO week number, 1-53.
    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    /// True when `next` is exactly the week after `self`.
    pub fn is_followed_by(&self, next: &IsoWeekStamp) -> bool {
        next.monday - self.monday == Duration::weeks(1)
    }

    /// Number of weeks from `self` to `later`; negative when `later` is earlier.
    pub fn weeks_until(&self, later: &IsoWeekStamp) -> i64 {
        (later.monday - self.monday).num_weeks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stamp_carries_iso_numbering() {
        let stamp = IsoWeekStamp::of(date(2024, 3, 6));
        assert_eq!(stamp.year(), 2024);
        assert_eq!(stamp.week(), 10);
        assert_eq!(stamp.monday(), date(2024, 3, 4));
    }

    #[test]
    fn consecutive_weeks_within_a_year() {
        let a = IsoWeekStamp::of(date(2024, 1, 1));
        let b = IsoWeekStamp::of(date(2024, 1, 8));
        let c = IsoWeekStamp::of(date(2024, 1, 22));
        assert!(a.is_followed_by(&b));
        assert!(!b.is_followed_by(&c));
        assert_eq!(b.weeks_until(&c), 2);
    }

    #[test]
    fn same_week_is_not_a_successor() {
        let mon = IsoWeekStamp::of(date(2024, 6, 10));
        let sun = IsoWeekStamp::of(date(2024, 6, 16));
        assert_eq!(mon, sun);
        assert!(!mon.is_followed_by(&sun));
    }

    #[test]
    fn iso_year_rollover_is_adjacent() {
        // 2024-12-30 belongs to ISO week 2025-W01.
        let w52 = IsoWeekStamp::of(date(2024, 12, 23));
        let w01 = IsoWeekStamp::of(date(2024, 12, 30));
        assert_eq!((w52.year(), w52.week()), (2024, 52));
        assert_eq!((w01.year(), w01.week()), (2025, 1));
        assert!(w52.is_followed_by(&w01));
    }

    #[test]
    fn week_53_rolls_into_week_1() {
        // 2026 has 53 ISO weeks; 2027-01-01 is a Friday in 2026-W53.
        let w53 = IsoWeekStamp::of(date(2027, 1, 1));
        let w01 = IsoWeekStamp::of(date(2027, 1, 8));
        assert_eq!(w53.week(), 53);
        assert_eq!(w01.week(), 1);
        assert!(w53.is_followed_by(&w01));
    }
}
