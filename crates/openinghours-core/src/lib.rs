//! # Openinghours Core Library
//!
//! Converts a day-by-day feed of facility opening and closing times into a
//! compact list of recurring calendar rules for one year.
//!
//! ## Architecture
//!
//! - **Normalizer**: sorts raw day records, drops the stray prior-year record
//!   and resolves the midnight sentinel into start/end of day
//! - **Sequence accumulator**: merges the same daily window on the same
//!   weekday across consecutive ISO weeks into runs
//! - **Rule compressor**: turns closed runs into weekly or yearly rules
//! - **Pipeline**: wires a [`FeedSource`] and a [`RuleSink`] around the above,
//!   once per `(service, year)`
//!
//! ## Key Components
//!
//! - [`Importer`]: per-year and horizon imports with explicit collaborators
//! - [`build_rules`]: the pure records-to-rules transformation
//! - [`Config`]: importer configuration management

pub mod batch;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod pipeline;
pub mod rules;
pub mod sequence;
pub mod sink;
pub mod storage;
pub mod week;

pub use batch::{CalendarSettings, RuleBatch};
pub use error::{BoxError, ConfigError, CoreError, ImportError, RecurrenceParseError};
pub use feed::{FeedQuery, FeedSource, JsonFileFeed, MemoryFeed, RawOpeningRecord, Service, TimeBasis};
pub use normalize::{Interval, Normalizer};
pub use pipeline::{build_rules, Horizon, HorizonReport, Importer, YearOutcome};
pub use rules::{compress, Recurrence, Rule};
pub use sequence::{accumulate, ClosedSequence, RunningSequence, SequenceAccumulator, SequenceKey, Transition};
pub use sink::{JsonSink, MemorySink, RuleSink};
pub use storage::Config;
pub use week::IsoWeekStamp;
