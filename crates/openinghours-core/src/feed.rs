//! Opening-hours feed records and the feed-fetch collaborator.
//!
//! The external feed answers one query per `(service, year)` with a list of
//! day records, each holding up to two `(from, to)` timestamp pairs. Records
//! arrive unordered and may include a stray record from the previous year.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, ImportError};

/// One day record as delivered by the feed.
///
/// Field names follow the feed's JSON shape (`Date`, `From1`, `To1`, ...).
/// A `null`, missing or empty value means "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawOpeningRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub from1: Option<String>,
    #[serde(default)]
    pub to1: Option<String>,
    #[serde(default)]
    pub from2: Option<String>,
    #[serde(default)]
    pub to2: Option<String>,
}

impl RawOpeningRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// Set the first `(from, to)` pair.
    pub fn with_first(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from1 = Some(from.into());
        self.to1 = Some(to.into());
        self
    }

    /// Set the second `(from, to)` pair.
    pub fn with_second(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from2 = Some(from.into());
        self.to2 = Some(to.into());
        self
    }

    /// The two `(from, to)` halves with field names, blanks mapped to `None`.
    pub(crate) fn halves(&self) -> [Half<'_>; 2] {
        [
            Half {
                from: ("From1", present(&self.from1)),
                to: ("To1", present(&self.to1)),
            },
            Half {
                from: ("From2", present(&self.from2)),
                to: ("To2", present(&self.to2)),
            },
        ]
    }

    pub(crate) fn date_value(&self) -> Option<&str> {
        present(&self.date)
    }
}

pub(crate) struct Half<'a> {
    pub from: (&'static str, Option<&'a str>),
    pub to: (&'static str, Option<&'a str>),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// How feed timestamps are mapped onto the single wall clock used for
/// day-of-week and ISO-week bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBasis {
    /// Keep the wall-clock time exactly as the feed wrote it; offsets are dropped.
    #[default]
    FeedLocal,
    /// Shift offset-bearing timestamps into this offset before bucketing.
    /// Timestamps without an offset are taken to be in it already.
    Fixed(FixedOffset),
}

impl TimeBasis {
    fn localize(&self, instant: DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            TimeBasis::FeedLocal => instant.naive_local(),
            TimeBasis::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }

    /// Parse a feed timestamp into the normalized wall clock.
    ///
    /// Accepts `YYYY-MM-DDTHH:MM:SS[.fraction][offset]` and plain `YYYY-MM-DD`.
    pub fn parse_timestamp(
        &self,
        field: &'static str,
        raw: &str,
    ) -> Result<NaiveDateTime, ImportError> {
        let raw = raw.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Ok(self.localize(instant));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
            })
            .map_err(|e| ImportError::feed_format(field, raw, e))
    }
}

impl fmt::Display for TimeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBasis::FeedLocal => f.write_str("feed-local"),
            TimeBasis::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for TimeBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("feed-local") {
            return Ok(TimeBasis::FeedLocal);
        }
        if s == "Z" || s.eq_ignore_ascii_case("utc") {
            return Ok(TimeBasis::Fixed(FixedOffset::east_opt(0).ok_or("invalid offset")?));
        }

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(format!("expected 'feed-local' or an offset like +01:00, got '{s}'")),
        };
        let (hours, minutes) = rest
            .split_once(':')
            .ok_or_else(|| format!("offset '{s}' must look like +HH:MM"))?;
        let hours: i32 = hours.parse().map_err(|_| format!("bad hours in '{s}'"))?;
        let minutes: i32 = minutes.parse().map_err(|_| format!("bad minutes in '{s}'"))?;
        if hours > 23 || minutes > 59 {
            return Err(format!("offset '{s}' out of range"));
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(TimeBasis::Fixed)
            .ok_or_else(|| format!("offset '{s}' out of range"))
    }
}

impl Serialize for TimeBasis {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeBasis {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A service whose opening hours are published by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub label: String,
    /// Infrastructure identifier in the feed.
    pub identifier: String,
}

impl Service {
    pub fn new(label: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identifier: identifier.into(),
        }
    }
}

/// One feed request: all openings of one infrastructure within one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedQuery {
    pub infrastructure_id: String,
    pub shop_id: String,
    pub year: i32,
    pub from: NaiveDateTime,
    pub until: NaiveDateTime,
}

impl FeedQuery {
    /// Query window `[year-01-01T00:00, (year+1)-01-01T00:00)`.
    pub fn for_year(service: &Service, shop_id: &str, year: i32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1)?.and_time(NaiveTime::MIN);
        let until = NaiveDate::from_ymd_opt(year + 1, 1, 1)?.and_time(NaiveTime::MIN);
        Some(Self {
            infrastructure_id: service.identifier.clone(),
            shop_id: shop_id.to_string(),
            year,
            from,
            until,
        })
    }
}

/// Feed-fetch collaborator.
///
/// Retries, authentication and transport belong to the implementation; the
/// importer calls it once per `(service, year)` and never retries.
pub trait FeedSource {
    /// Fetch the raw day records for one query. An empty list means the
    /// service has no openings that year.
    fn fetch_openings(&self, query: &FeedQuery) -> Result<Vec<RawOpeningRecord>, BoxError>;
}

/// Feed source backed by JSON files.
///
/// `path` is either a single JSON array of records (served for every query)
/// or a directory holding `<identifier>-<year>.json` files. A missing file in
/// directory mode means an empty year.
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_for(&self, query: &FeedQuery) -> PathBuf {
        if self.path.is_dir() {
            self.path
                .join(format!("{}-{}.json", query.infrastructure_id, query.year))
        } else {
            self.path.clone()
        }
    }
}

impl FeedSource for JsonFileFeed {
    fn fetch_openings(&self, query: &FeedQuery) -> Result<Vec<RawOpeningRecord>, BoxError> {
        let file = self.file_for(query);
        if self.path.is_dir() && !file.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&file)
            .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
        let records: Vec<RawOpeningRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }
}

/// In-memory feed keyed by `(identifier, year)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    years: Vec<(String, i32, Vec<RawOpeningRecord>)>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(
        mut self,
        identifier: impl Into<String>,
        year: i32,
        records: Vec<RawOpeningRecord>,
    ) -> Self {
        self.years.push((identifier.into(), year, records));
        self
    }
}

impl FeedSource for MemoryFeed {
    fn fetch_openings(&self, query: &FeedQuery) -> Result<Vec<RawOpeningRecord>, BoxError> {
        Ok(self
            .years
            .iter()
            .find(|(id, year, _)| *id == query.infrastructure_id && *year == query.year)
            .map(|(_, _, records)| records.clone())
            .unwrap_or_default())
    }
}
