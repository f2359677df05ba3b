//! Weekly sequence detection.
//!
//! Intervals sharing a [`SequenceKey`] (same weekday, same start and end time)
//! are merged while they keep appearing in consecutive ISO weeks. A gap, or a
//! second occurrence within the same week, closes the running sequence and a
//! fresh one is opened from the interval that broke it.
//!
//! Intervals must be pushed in non-decreasing date order across all keys; the
//! week comparison is meaningless otherwise.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::normalize::Interval;
use crate::week::IsoWeekStamp;

/// Daily time window on one weekday, at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceKey {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub day_of_week: Weekday,
}

impl SequenceKey {
    pub fn new(start: NaiveTime, end: NaiveTime, day_of_week: Weekday) -> Self {
        Self {
            start: truncate_to_minute(start),
            end: truncate_to_minute(end),
            day_of_week,
        }
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// An uninterrupted weekly run that is still accepting occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningSequence {
    pub anchor_start: NaiveDateTime,
    pub anchor_end: NaiveDateTime,
    pub last_seen_until: NaiveDateTime,
    pub last_iso_week: IsoWeekStamp,
}

impl RunningSequence {
    fn open(interval: &Interval) -> Self {
        Self {
            anchor_start: interval.start,
            anchor_end: interval.end,
            last_seen_until: interval.end,
            last_iso_week: interval.iso_week,
        }
    }

    fn close(&self) -> ClosedSequence {
        ClosedSequence {
            start_date: self.anchor_start,
            end_date: self.anchor_end,
            until_date: self.last_seen_until,
        }
    }
}

/// A finished weekly run: first occurrence plus the end of the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedSequence {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub until_date: NaiveDateTime,
}

impl ClosedSequence {
    /// True when the run never got past its first occurrence.
    pub fn is_single_occurrence(&self) -> bool {
        self.end_date.date() == self.until_date.date()
    }
}

/// What pushing one interval did to its key's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First interval for the key; a sequence was opened.
    Opened,
    /// Interval falls in the week right after the last one; the run grew.
    Extended,
    /// Gap or same-week repeat; the previous run was closed and a new one opened.
    Restarted(ClosedSequence),
}

#[derive(Debug, Default)]
struct KeyState {
    running: Option<RunningSequence>,
    closed: Vec<ClosedSequence>,
}

/// Per-key state machine over a date-ordered interval stream.
///
/// Keys keep the order in which they were first seen; that order, then the
/// chronological order within each key, is the order of [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct SequenceAccumulator {
    keys: IndexMap<SequenceKey, KeyState>,
    last_date: Option<NaiveDate>,
}

impl SequenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys seen so far.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// The open sequence for `key`, if any.
    pub fn running(&self, key: &SequenceKey) -> Option<&RunningSequence> {
        self.keys.get(key).and_then(|state| state.running.as_ref())
    }

    /// Feed the next interval.
    ///
    /// # Errors
    /// Returns [`ImportError::OrderingViolation`] if `interval` is dated before
    /// the previously pushed one. State is left untouched in that case.
    pub fn push(&mut self, interval: &Interval) -> Result<Transition, ImportError> {
        let date = interval.date();
        if let Some(previous) = self.last_date {
            if date < previous {
                return Err(ImportError::OrderingViolation {
                    previous,
                    next: date,
                });
            }
        }
        self.last_date = Some(date);

        let state = self.keys.entry(interval.key()).or_default();
        let transition = match state.running.as_mut() {
            None => {
                state.running = Some(RunningSequence::open(interval));
                Transition::Opened
            }
            Some(running) if running.last_iso_week.is_followed_by(&interval.iso_week) => {
                running.last_seen_until = interval.end;
                running.last_iso_week = interval.iso_week;
                Transition::Extended
            }
            Some(running) => {
                let closed = running.close();
                state.closed.push(closed);
                *running = RunningSequence::open(interval);
                Transition::Restarted(closed)
            }
        };
        Ok(transition)
    }

    /// Close every still-open sequence and return all closed sequences,
    /// grouped by key in discovery order, chronological within a key.
    pub fn finish(self) -> Vec<ClosedSequence> {
        self.keys
            .into_values()
            .flat_map(|state| {
                let mut closed = state.closed;
                closed.extend(state.running.map(|running| running.close()));
                closed
            })
            .collect()
    }
}

/// Run a whole date-ordered interval list through a fresh accumulator.
pub fn accumulate(intervals: &[Interval]) -> Result<Vec<ClosedSequence>, ImportError> {
    let mut accumulator = SequenceAccumulator::new();
    for interval in intervals {
        let transition = accumulator.push(interval)?;
        tracing::trace!(start = %interval.start, ?transition, "interval accumulated");
    }
    tracing::debug!(keys = accumulator.key_count(), "accumulation finished");
    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    fn day(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    fn window(date: NaiveDate) -> Interval {
        Interval::new(at(date, 8, 0), at(date, 18, 0))
    }

    #[test]
    fn key_ignores_seconds() {
        let a = SequenceKey::new(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            Weekday::Mon,
        );
        let b = SequenceKey::new(
            NaiveTime::from_hms_opt(8, 0, 30).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            Weekday::Mon,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_weeks_extend() {
        let mut acc = SequenceAccumulator::new();
        let monday = day(2024, 1, 1);
        assert_eq!(acc.push(&window(monday)).unwrap(), Transition::Opened);
        assert_eq!(
            acc.push(&window(monday + Duration::weeks(1))).unwrap(),
            Transition::Extended
        );

        let running = acc.running(&window(monday).key()).unwrap();
        assert_eq!(running.anchor_start, at(monday, 8, 0));
        assert_eq!(running.last_seen_until, at(day(2024, 1, 8), 18, 0));
        assert_eq!(running.last_iso_week.week(), 2);
    }

    #[test]
    fn gap_closes_and_reopens() {
        let mut acc = SequenceAccumulator::new();
        acc.push(&window(day(2024, 1, 1))).unwrap();
        acc.push(&window(day(2024, 1, 8))).unwrap();
        let transition = acc.push(&window(day(2024, 1, 22))).unwrap();

        let expected = ClosedSequence {
            start_date: at(day(2024, 1, 1), 8, 0),
            end_date: at(day(2024, 1, 1), 18, 0),
            until_date: at(day(2024, 1, 8), 18, 0),
        };
        assert_eq!(transition, Transition::Restarted(expected));

        let running = acc.running(&window(day(2024, 1, 1)).key()).unwrap();
        assert_eq!(running.anchor_start, at(day(2024, 1, 22), 8, 0));
    }

    #[test]
    fn same_week_repeat_is_treated_as_gap() {
        // Two identical Monday windows in the same ISO week are not merged.
        let mut acc = SequenceAccumulator::new();
        let monday = day(2024, 2, 5);
        acc.push(&window(monday)).unwrap();
        let transition = acc.push(&window(monday)).unwrap();
        assert!(matches!(transition, Transition::Restarted(_)));
        assert_eq!(acc.finish().len(), 2);
    }

    #[test]
    fn single_occurrence_closes_on_finish() {
        let mut acc = SequenceAccumulator::new();
        acc.push(&window(day(2024, 5, 1))).unwrap();
        let closed = acc.finish();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].start_date, at(day(2024, 5, 1), 8, 0));
        assert_eq!(closed[0].end_date, closed[0].until_date);
        assert!(closed[0].is_single_occurrence());
    }

    #[test]
    fn keys_are_independent() {
        let mut acc = SequenceAccumulator::new();
        let monday = day(2024, 1, 1);
        let tuesday = day(2024, 1, 2);
        acc.push(&window(monday)).unwrap();
        acc.push(&Interval::new(at(monday, 13, 0), at(monday, 17, 0))).unwrap();
        acc.push(&window(tuesday)).unwrap();
        assert_eq!(
            acc.push(&window(monday + Duration::weeks(1))).unwrap(),
            Transition::Extended
        );
        assert_eq!(acc.key_count(), 3);
    }

    #[test]
    fn finish_orders_by_key_discovery_then_time() {
        let mut acc = SequenceAccumulator::new();
        let monday = day(2024, 1, 1);
        let tuesday = day(2024, 1, 2);
        acc.push(&window(monday)).unwrap();
        acc.push(&window(tuesday)).unwrap();
        acc.push(&window(monday + Duration::weeks(3))).unwrap();

        let starts: Vec<_> = acc.finish().iter().map(|c| c.start_date).collect();
        assert_eq!(
            starts,
            vec![
                at(monday, 8, 0),
                at(monday + Duration::weeks(3), 8, 0),
                at(tuesday, 8, 0),
            ]
        );
    }

    #[test]
    fn out_of_order_interval_is_rejected() {
        let mut acc = SequenceAccumulator::new();
        acc.push(&window(day(2024, 3, 4))).unwrap();
        let err = acc.push(&window(day(2024, 2, 26))).unwrap_err();
        assert!(matches!(err, ImportError::OrderingViolation { .. }));
    }

    #[test]
    fn accumulate_runs_whole_stream() {
        let intervals: Vec<_> = (0..5)
            .map(|w| window(day(2024, 1, 1) + Duration::weeks(w)))
            .collect();
        let closed = accumulate(&intervals).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].until_date, at(day(2024, 1, 29), 18, 0));
    }
}
