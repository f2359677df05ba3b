//! Closed sequences to labeled recurrence rules.
//!
//! A run that never repeated becomes a yearly anniversary rule; everything
//! else becomes a weekly rule on the weekday of its first occurrence.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RecurrenceParseError;
use crate::normalize::end_of_day;
use crate::sequence::ClosedSequence;

/// Two-letter weekday symbols, Sunday first.
pub const WEEKDAYS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn weekday_symbol(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_sunday() as usize]
}

fn weekday_from_symbol(symbol: &str) -> Option<Weekday> {
    let index = WEEKDAYS.iter().position(|s| *s == symbol)?;
    Some(SUNDAY_FIRST[index])
}

/// Recurrence of a rule. Renders as one of exactly two expressions:
/// `FREQ=YEARLY;BYMONTH=<m>;BYMONTHDAY=<d>` or `BYDAY=<dd>;FREQ=WEEKLY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recurrence {
    Yearly { month: u32, day: u32 },
    Weekly { day: Weekday },
}

impl Recurrence {
    pub fn is_weekly(&self) -> bool {
        matches!(self, Recurrence::Weekly { .. })
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Yearly { month, day } => {
                write!(f, "FREQ=YEARLY;BYMONTH={month};BYMONTHDAY={day}")
            }
            Recurrence::Weekly { day } => write!(f, "BYDAY={};FREQ=WEEKLY", weekday_symbol(*day)),
        }
    }
}

impl FromStr for Recurrence {
    type Err = RecurrenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| RecurrenceParseError {
            expression: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<(&str, &str)> = s
            .split(';')
            .map(|part| part.split_once('=').ok_or_else(|| fail("expected KEY=VALUE parts")))
            .collect::<Result<_, _>>()?;

        match parts.as_slice() {
            [("FREQ", "YEARLY"), ("BYMONTH", month), ("BYMONTHDAY", day)] => {
                let month: u32 = month.parse().map_err(|_| fail("BYMONTH is not a number"))?;
                let day: u32 = day.parse().map_err(|_| fail("BYMONTHDAY is not a number"))?;
                if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                    return Err(fail("month or day out of range"));
                }
                Ok(Recurrence::Yearly { month, day })
            }
            [("BYDAY", symbol), ("FREQ", "WEEKLY")] => weekday_from_symbol(symbol)
                .map(|day| Recurrence::Weekly { day })
                .ok_or_else(|| fail("unknown weekday symbol")),
            _ => Err(fail("not a yearly or weekly expression")),
        }
    }
}

impl Serialize for Recurrence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Recurrence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A terminal recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// 1-based position in the batch.
    pub ordinal: u32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub until_date: NaiveDate,
    #[serde(rename = "rrule")]
    pub recurrence: Recurrence,
}

impl Rule {
    fn from_sequence(ordinal: u32, sequence: &ClosedSequence) -> Self {
        let recurrence = if sequence.is_single_occurrence() {
            Recurrence::Yearly {
                month: sequence.start_date.month(),
                day: sequence.start_date.day(),
            }
        } else {
            Recurrence::Weekly {
                day: sequence.start_date.weekday(),
            }
        };

        Self {
            ordinal,
            start_date: sequence.start_date,
            end_date: sequence.end_date,
            until_date: end_of_day(sequence.until_date.date()).date(),
            recurrence,
        }
    }
}

/// Label every closed sequence, keeping the given order.
pub fn compress(sequences: &[ClosedSequence]) -> Vec<Rule> {
    sequences
        .iter()
        .zip(1u32..)
        .map(|(sequence, ordinal)| Rule::from_sequence(ordinal, sequence))
        .collect()
}
