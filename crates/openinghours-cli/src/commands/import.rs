use std::path::{Path, PathBuf};

use chrono::Datelike;
use clap::Args;
use openinghours_core::error::Result;
use openinghours_core::{CoreError, Horizon, Importer, JsonFileFeed, JsonSink, Service};

use super::load_config;

#[derive(Args)]
pub struct ImportArgs {
    /// Infrastructure identifier of the service in the feed
    #[arg(long)]
    service: String,
    /// Display label of the service (defaults to the identifier)
    #[arg(long)]
    label: Option<String>,
    /// Feed JSON file, or a directory of <identifier>-<year>.json files
    #[arg(long)]
    feed: PathBuf,
    /// Import a single year instead of the configured horizon
    #[arg(long)]
    year: Option<i32>,
}

pub fn run(args: ImportArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let horizon = match args.year {
        Some(year) => Horizon::single(year),
        None => config.horizon(chrono::Local::now().year()),
    };
    let service = Service::new(
        args.label.unwrap_or_else(|| args.service.clone()),
        args.service,
    );

    let feed = JsonFileFeed::new(args.feed);
    let sink = JsonSink::new(std::io::stdout().lock());
    let mut importer = Importer::from_config(feed, sink, &config);
    let report = importer.import_horizon(&service, horizon);

    for (year, result) in &report.years {
        match result {
            Ok(outcome) => tracing::info!(year, ?outcome, "year done"),
            Err(e) => eprintln!("{year}: {e}"),
        }
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CoreError::Custom(format!(
            "{failed} year(s) failed for '{}'",
            report.service
        )));
    }
    Ok(())
}
