//! Import entry point: feed records in, one rule batch per year out.
//!
//! The pipeline for one `(service, year)` is strictly linear:
//! raw records -> [`Normalizer`] -> [`SequenceAccumulator`](crate::sequence::SequenceAccumulator)
//! -> [`compress`] -> [`RuleSink`]. All state lives on the stack of one call.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::batch::{CalendarSettings, RuleBatch};
use crate::error::ImportError;
use crate::feed::{FeedQuery, FeedSource, RawOpeningRecord, Service, TimeBasis};
use crate::normalize::Normalizer;
use crate::rules::{compress, Rule};
use crate::sequence::accumulate;
use crate::sink::RuleSink;
use crate::storage::Config;

/// Turn one year's raw records into ordered rules without touching any
/// collaborator. Re-running on the same input yields the same rules.
pub fn build_rules(
    year: i32,
    basis: TimeBasis,
    records: &[RawOpeningRecord],
) -> Result<Vec<Rule>, ImportError> {
    let intervals = Normalizer::new(year)
        .with_time_basis(basis)
        .normalize(records)?;
    let sequences = accumulate(&intervals)?;
    Ok(compress(&sequences))
}

/// Result of a successful year import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum YearOutcome {
    /// A batch with this many rules was handed to the sink.
    Imported { rules: usize },
    /// The feed had no openings for the year; nothing was stored.
    Skipped,
}

/// Inclusive range of calendar years to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizon {
    pub start_year: i32,
    pub end_year: i32,
}

impl Horizon {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
        }
    }

    /// `start_year` through `start_year + years_ahead`.
    pub fn from_year(start_year: i32, years_ahead: u32) -> Self {
        let ahead = i32::try_from(years_ahead).unwrap_or(i32::MAX);
        Self::new(start_year, start_year.saturating_add(ahead))
    }

    pub fn single(year: i32) -> Self {
        Self::new(year, year)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}

/// Per-year results of a horizon run.
#[derive(Debug)]
pub struct HorizonReport {
    pub service: String,
    pub years: Vec<(i32, Result<YearOutcome, ImportError>)>,
}

impl HorizonReport {
    pub fn has_failures(&self) -> bool {
        self.years.iter().any(|(_, result)| result.is_err())
    }

    /// Years that produced a stored batch.
    pub fn imported_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.iter().filter_map(|(year, result)| match result {
            Ok(YearOutcome::Imported { .. }) => Some(*year),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (i32, &ImportError)> + '_ {
        self.years
            .iter()
            .filter_map(|(year, result)| result.as_ref().err().map(|e| (*year, e)))
    }
}

/// Runs imports against explicit feed and sink collaborators.
pub struct Importer<F, S> {
    feed: F,
    sink: S,
    shop_id: String,
    time_basis: TimeBasis,
    calendar: CalendarSettings,
}

impl<F: FeedSource, S: RuleSink> Importer<F, S> {
    pub fn new(feed: F, sink: S) -> Self {
        Self {
            feed,
            sink,
            shop_id: String::new(),
            time_basis: TimeBasis::default(),
            calendar: CalendarSettings::default(),
        }
    }

    /// Take shop id, time basis and calendar settings from `config`.
    pub fn from_config(feed: F, sink: S, config: &Config) -> Self {
        Self::new(feed, sink)
            .with_shop_id(config.feed.shop_id.clone())
            .with_time_basis(config.feed.time_basis)
            .with_calendar(config.calendar.clone())
    }

    pub fn with_shop_id(mut self, shop_id: impl Into<String>) -> Self {
        self.shop_id = shop_id.into();
        self
    }

    pub fn with_time_basis(mut self, basis: TimeBasis) -> Self {
        self.time_basis = basis;
        self
    }

    pub fn with_calendar(mut self, calendar: CalendarSettings) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Import one year of one service.
    ///
    /// # Errors
    /// Any [`ImportError`]; the sink is not called for a failed year.
    pub fn import_year(&mut self, service: &Service, year: i32) -> Result<YearOutcome, ImportError> {
        if service.identifier.trim().is_empty() {
            return Err(ImportError::MissingField {
                field: "identifier",
            });
        }

        let query = FeedQuery::for_year(service, &self.shop_id, year).ok_or_else(|| {
            ImportError::feed_format("year", year.to_string(), "year out of range")
        })?;
        let records = self
            .feed
            .fetch_openings(&query)
            .map_err(|source| ImportError::Feed {
                service: service.label.clone(),
                source,
            })?;

        if records.is_empty() {
            tracing::info!(service = %service.label, year, "feed returned no openings, skipping year");
            return Ok(YearOutcome::Skipped);
        }

        let rules = build_rules(year, self.time_basis, &records)?;
        if rules.is_empty() {
            tracing::info!(service = %service.label, year, "no openings within the year, skipping");
            return Ok(YearOutcome::Skipped);
        }

        let count = rules.len();
        let batch = RuleBatch::new(&service.label, year, &self.calendar, rules).ok_or_else(|| {
            ImportError::feed_format("year", year.to_string(), "year out of range")
        })?;
        self.sink.store(batch).map_err(|source| ImportError::Sink {
            service: service.label.clone(),
            year,
            source,
        })?;

        tracing::info!(service = %service.label, year, rules = count, "imported opening hours");
        Ok(YearOutcome::Imported { rules: count })
    }

    /// Import every year of `horizon`. A failing year is logged and
    /// recorded; the remaining years still run.
    pub fn import_horizon(&mut self, service: &Service, horizon: Horizon) -> HorizonReport {
        let mut years = Vec::new();
        for year in horizon.years() {
            let result = self.import_year(service, year);
            if let Err(err) = &result {
                tracing::warn!(service = %service.label, year, error = %err, "year import failed");
            }
            years.push((year, result));
        }
        HorizonReport {
            service: service.label.clone(),
            years,
        }
    }
}
