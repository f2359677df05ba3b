//! The calendar container one year's rules are persisted in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rules::Rule;

/// Presentation settings for generated calendars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Display channel the generated calendars belong to.
    pub channel_name: String,
    pub calendar_label: String,
    /// Prefix of the per-year label, followed by the year's date range.
    pub label_prefix: String,
    pub priority: i32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            channel_name: "Recreatex".into(),
            calendar_label: "Openingsuren".into(),
            label_prefix: "Geïmporteerde kalender".into(),
            priority: 0,
        }
    }
}

/// All rules of one `(service, year)`, handed to the sink in one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBatch {
    pub service: String,
    pub channel: String,
    pub year: i32,
    pub label: String,
    pub calendar_label: String,
    pub priority: i32,
    pub closing_hours: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rules: Vec<Rule>,
}

impl RuleBatch {
    /// Returns `None` only for years chrono cannot represent.
    pub fn new(
        service: &str,
        year: i32,
        settings: &CalendarSettings,
        rules: Vec<Rule>,
    ) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end_date = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self {
            service: service.to_string(),
            channel: settings.channel_name.clone(),
            year,
            label: format!("{}{} -{}", settings.label_prefix, start_date, end_date),
            calendar_label: settings.calendar_label.clone(),
            priority: settings.priority,
            closing_hours: false,
            start_date,
            end_date,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_covers_the_whole_year() {
        let batch = RuleBatch::new("Zwembad", 2025, &CalendarSettings::default(), Vec::new()).unwrap();
        assert_eq!(batch.start_date.to_string(), "2025-01-01");
        assert_eq!(batch.end_date.to_string(), "2025-12-31");
        assert_eq!(batch.label, "Geïmporteerde kalender2025-01-01 -2025-12-31");
        assert_eq!(batch.channel, "Recreatex");
        assert!(!batch.closing_hours);
    }
}
