//! Expectation runner for rule files.
//!
//! Rule files may carry `test_url` / `test_contains` lines next to their
//! directives. Each `test_url` starts an expectation; each following
//! `test_contains` adds a fragment that must appear in the plain-text
//! rendition of that page.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::cascade::Cascade;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::rules::split_line;
use crate::rules::store::RULE_FILE_EXTENSION;

const TEST_URL: &str = "test_url";
const TEST_CONTAINS: &str = "test_contains";

/// A page and the fragments its plain text must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub url: String,
    pub fragments: Vec<String>,
}

impl Expectation {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fragments: Vec::new(),
        }
    }

    /// Fragments absent from `text`, in declaration order.
    #[must_use]
    pub fn missing_fragments(&self, text: &str) -> Vec<String> {
        self.fragments
            .iter()
            .filter(|f| !text.contains(f.as_str()))
            .cloned()
            .collect()
    }
}

/// Parse expectations from file text. `origin` is only used in errors.
///
/// Directive lines are ignored. A `test_contains` before any `test_url`
/// rejects the whole file.
pub fn parse_expectations(text: &str, origin: &Path) -> Result<Vec<Expectation>> {
    let mut expectations: Vec<Expectation> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let Some((label, content)) = split_line(line) else {
            continue;
        };
        match label {
            TEST_URL => expectations.push(Expectation::new(content.trim())),
            TEST_CONTAINS => match expectations.last_mut() {
                Some(current) => current.fragments.push(content.trim().to_string()),
                None => {
                    return Err(Error::MalformedExpectationFile {
                        path: origin.to_path_buf(),
                        line: index + 1,
                    })
                }
            },
            _ => {}
        }
    }

    Ok(expectations)
}

/// Read and parse one expectation file.
pub fn load_expectations(path: impl AsRef<Path>) -> Result<Vec<Expectation>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    parse_expectations(&String::from_utf8_lossy(&bytes), path)
}

/// Every rule file in `dir`, sorted by name.
fn rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == RULE_FILE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Text carried by a caught panic.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Outcome status. Serialized as `"OK"` / `"EXCEPTION"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    Exception,
}

/// Result of running one expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub url: String,
    pub status: Status,
    /// Error text when `status` is `Exception`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub missing_fragments: Vec<String>,
}

impl TestOutcome {
    /// Extraction succeeded and every fragment was found.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Ok && self.missing_fragments.is_empty()
    }
}

/// Fetches and extracts each expectation's page and checks its fragments.
#[derive(Debug)]
pub struct SpecTestRunner<F> {
    cascade: Cascade,
    fetcher: F,
}

impl<F: Fetcher> SpecTestRunner<F> {
    pub fn new(cascade: Cascade, fetcher: F) -> Self {
        Self { cascade, fetcher }
    }

    /// Run one expectation. Failures, including panics in the fetcher,
    /// extractor or renderer, become an `Exception` outcome.
    pub fn run(&self, expectation: &Expectation) -> TestOutcome {
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            self.cascade.extract_url(&self.fetcher, &expectation.url)
        }));
        let extracted = match extracted {
            Ok(extracted) => extracted.map_err(|err| err.to_string()),
            Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
        };

        match extracted {
            Ok(result) => {
                let missing_fragments = expectation.missing_fragments(&result.plaintext);
                info!(url = %expectation.url, missing = missing_fragments.len(), "checked");
                TestOutcome {
                    url: expectation.url.clone(),
                    status: Status::Ok,
                    message: None,
                    missing_fragments,
                }
            }
            Err(message) => {
                warn!(url = %expectation.url, error = %message, "extraction failed");
                TestOutcome {
                    url: expectation.url.clone(),
                    status: Status::Exception,
                    message: Some(message),
                    missing_fragments: Vec::new(),
                }
            }
        }
    }

    pub fn run_all(&self, expectations: &[Expectation]) -> Vec<TestOutcome> {
        expectations.iter().map(|e| self.run(e)).collect()
    }

    /// Load every rule file in `dir`, then run all their expectations.
    ///
    /// Any malformed file aborts before a single page is fetched.
    pub fn run_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<TestOutcome>> {
        let mut expectations = Vec::new();
        for path in rule_files(dir.as_ref())? {
            expectations.extend(load_expectations(&path)?);
        }
        Ok(self.run_all(&expectations))
    }
}
