//! Basic CLI E2E tests.
//!
//! Tests run the built binary against temporary config and feed files.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(config: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_openinghours-cli"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

const FEED: &str = r#"[
  {"Date":"2024-01-08T00:00:00","From1":"2024-01-08T08:00:00","To1":"2024-01-08T18:00:00","From2":null,"To2":null},
  {"Date":"2024-01-01T00:00:00","From1":"2024-01-01T08:00:00","To1":"2024-01-01T18:00:00","From2":null,"To2":null},
  {"Date":"2023-12-31T00:00:00","From1":"2023-12-31T08:00:00","To1":"2023-12-31T18:00:00"},
  {"Date":"2024-04-21T00:00:00","From1":"2024-04-21T10:00:00","To1":"2024-04-22T00:00:00"}
]"#;

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let (stdout, _, code) = run_cli(&config, &["config", "set", "feed.shop_id", "shop-42"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("ok"));

    let (stdout, _, code) = run_cli(&config, &["config", "get", "feed.shop_id"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "shop-42");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (_, stderr, code) = run_cli(&config, &["config", "get", "feed.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown configuration key: feed.nope"));
}

#[test]
fn test_config_list_is_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (stdout, _, code) = run_cli(&config, &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["horizon"]["years_ahead"], 3);
}

#[test]
fn test_rules_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let feed = dir.path().join("feed.json");
    std::fs::write(&feed, FEED).unwrap();

    let (stdout, stderr, code) = run_cli(
        &config,
        &["rules", "--feed", feed.to_str().unwrap(), "--year", "2024"],
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("BYDAY=MO;FREQ=WEEKLY"));
    assert!(lines[0].contains("2024-01-08"));
    assert!(lines[1].contains("FREQ=YEARLY;BYMONTH=4;BYMONTHDAY=21"));
    assert!(lines[1].contains("23:59"));
}

#[test]
fn test_import_single_year_prints_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let feed = dir.path().join("feed.json");
    std::fs::write(&feed, FEED).unwrap();

    let (stdout, stderr, code) = run_cli(
        &config,
        &[
            "import",
            "--service",
            "INFRA-1",
            "--label",
            "Zwembad",
            "--feed",
            feed.to_str().unwrap(),
            "--year",
            "2024",
        ],
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    let batch: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(batch["service"], "Zwembad");
    assert_eq!(batch["year"], 2024);
    assert_eq!(batch["rules"].as_array().unwrap().len(), 2);
    assert_eq!(batch["rules"][0]["rrule"], "BYDAY=MO;FREQ=WEEKLY");
}

#[test]
fn test_import_malformed_feed_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let feed = dir.path().join("feed.json");
    std::fs::write(
        &feed,
        r#"[{"Date":"2024-01-01T00:00:00","From1":"eight","To1":"2024-01-01T18:00:00"}]"#,
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(
        &config,
        &["import", "--service", "INFRA-1", "--feed", feed.to_str().unwrap(), "--year", "2024"],
    );
    assert_ne!(code, 0);
    assert!(stdout.trim().is_empty());
    assert!(stderr.contains("From1"));
}

#[test]
fn test_rules_missing_feed_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let feed = dir.path().join("absent.json");

    let (stdout, stderr, code) = run_cli(
        &config,
        &["rules", "--feed", feed.to_str().unwrap(), "--year", "2024"],
    );
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error: cannot read"), "stderr: {stderr}");
}
