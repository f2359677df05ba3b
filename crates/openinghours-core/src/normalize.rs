//! Raw day records to sorted, corrected intervals.
//!
//! Two feed defects are corrected here:
//! - the feed also returns the last day of the previous year, which is dropped;
//! - a time of exactly `00:00:00` is day-boundary shorthand ("open all day" is
//!   sent as `08:00` to `00:00` of the next day) and is replaced by the start
//!   or end of the record's own date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::feed::{RawOpeningRecord, TimeBasis};
use crate::sequence::SequenceKey;
use crate::week::IsoWeekStamp;

/// One opening window on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub day_of_week: Weekday,
    pub iso_week: IsoWeekStamp,
}

impl Interval {
    /// Day of week and ISO week are taken from `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            day_of_week: start.weekday(),
            iso_week: IsoWeekStamp::of(start.date()),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn key(&self) -> SequenceKey {
        SequenceKey::new(self.start.time(), self.end.time(), self.day_of_week)
    }
}

/// Last representable second of a day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn is_midnight(ts: &NaiveDateTime) -> bool {
    ts.num_seconds_from_midnight() == 0
}

/// Normalizes one year's feed response.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    year: i32,
    basis: TimeBasis,
}

impl Normalizer {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            basis: TimeBasis::FeedLocal,
        }
    }

    pub fn with_time_basis(mut self, basis: TimeBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Produce the date-sorted intervals of the target year.
    ///
    /// Every record is parsed before anything is discarded, so a single
    /// malformed value fails the whole year.
    pub fn normalize(&self, records: &[RawOpeningRecord]) -> Result<Vec<Interval>, ImportError> {
        let mut days = records
            .iter()
            .map(|record| self.parse_record(record))
            .collect::<Result<Vec<_>, _>>()?;

        // Stable, so the two halves of one date keep their feed order.
        days.sort_by_key(|(date, _)| *date);

        let mut intervals = Vec::with_capacity(days.len() * 2);
        for (date, halves) in days {
            if date.year() != self.year {
                tracing::debug!(%date, year = self.year, "dropping record outside target year");
                continue;
            }
            intervals.extend(halves.into_iter().flatten());
        }
        Ok(intervals)
    }

    fn parse_record(
        &self,
        record: &RawOpeningRecord,
    ) -> Result<(NaiveDate, [Option<Interval>; 2]), ImportError> {
        let raw_date = record
            .date_value()
            .ok_or(ImportError::MissingField { field: "Date" })?;
        // `Date` labels a calendar day; only the opening times are shifted.
        let date = TimeBasis::FeedLocal.parse_timestamp("Date", raw_date)?.date();

        let [first, second] = record.halves();
        let mut out = [None, None];
        for (slot, half) in out.iter_mut().zip([first, second]) {
            let start = half
                .from
                .1
                .map(|raw| self.basis.parse_timestamp(half.from.0, raw))
                .transpose()?;
            let end = half
                .to
                .1
                .map(|raw| self.basis.parse_timestamp(half.to.0, raw))
                .transpose()?;

            // A half with a missing endpoint is ignored entirely.
            if let (Some(start), Some(end)) = (start, end) {
                *slot = Some(Interval::new(
                    correct_start(date, start),
                    correct_end(date, end),
                ));
            }
        }
        Ok((date, out))
    }
}

fn correct_start(date: NaiveDate, ts: NaiveDateTime) -> NaiveDateTime {
    if is_midnight(&ts) {
        start_of_day(date)
    } else {
        ts
    }
}

fn correct_end(date: NaiveDate, ts: NaiveDateTime) -> NaiveDateTime {
    if is_midnight(&ts) {
        end_of_day(date)
    } else {
        ts
    }
}
