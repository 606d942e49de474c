//! Runs the `test_url` / `test_contains` expectations of every rule file in a
//! directory and prints one JSON line per page.
//!
//! Usage: `sitespec_test [DIR]` (default `sitespecs`). Log level via `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use sitespec::{Cascade, HttpFetcher, Options, SpecTestRunner};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let options = Options {
        sitespec_dir: std::env::args_os().nth(1).map_or_else(|| PathBuf::from("sitespecs"), PathBuf::from),
        ..Options::default()
    };
    let dir = options.sitespec_dir.clone();

    let fetcher = match HttpFetcher::new(&options) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            eprintln!("Failed to build HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };
    let runner = SpecTestRunner::new(Cascade::new(options), fetcher);

    let outcomes = match runner.run_dir(&dir) {
        Ok(outcomes) => outcomes,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut all_passed = true;
    for outcome in &outcomes {
        all_passed &= outcome.passed();
        match serde_json::to_string(outcome) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("Failed to serialize outcome for {}: {err}", outcome.url),
        }
    }

    if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
