use std::path::{Path, PathBuf};

use clap::Args;
use openinghours_core::error::Result;
use openinghours_core::{build_rules, CoreError, FeedQuery, FeedSource, JsonFileFeed, Service};

use super::load_config;

#[derive(Args)]
pub struct RulesArgs {
    /// Feed JSON file, or a directory of <identifier>-<year>.json files
    #[arg(long)]
    feed: PathBuf,
    /// Year to derive rules for
    #[arg(long)]
    year: i32,
    /// Identifier used to pick the file in directory mode
    #[arg(long, default_value = "local")]
    service: String,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: RulesArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let service = Service::new(args.service.clone(), args.service);
    let query = FeedQuery::for_year(&service, &config.feed.shop_id, args.year)
        .ok_or_else(|| CoreError::Custom(format!("year {} out of range", args.year)))?;

    let records = JsonFileFeed::new(args.feed).fetch_openings(&query)?;
    let rules = build_rules(args.year, config.feed.time_basis, &records)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("no openings in {}", args.year);
        return Ok(());
    }
    for rule in &rules {
        println!(
            "{:>3}  {}  {}  {}  {}",
            rule.ordinal,
            rule.start_date.format("%Y-%m-%d %H:%M"),
            rule.end_date.format("%Y-%m-%d %H:%M"),
            rule.until_date,
            rule.recurrence
        );
    }
    Ok(())
}
