//! Page retrieval for URL-driven extraction.

use crate::error::Result;

/// Retrieves raw page markup for a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Fixed pages keyed by URL, for offline runs and tests.
impl Fetcher for std::collections::HashMap<String, String> {
    fn fetch(&self, url: &str) -> Result<String> {
        self.get(url)
            .cloned()
            .ok_or_else(|| crate::Error::Fetch(format!("no page for {url}")))
    }
}

#[cfg(feature = "fetch")]
pub use http::HttpFetcher;

#[cfg(feature = "fetch")]
mod http {
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;
    use tracing::debug;

    use super::Fetcher;
    use crate::encoding::transcode_to_utf8;
    use crate::error::{Error, Result};
    use crate::options::Options;

    /// Blocking HTTP fetcher.
    ///
    /// Response bodies are decoded with the `Content-Type` charset when one
    /// is given, otherwise with the charset declared in the markup.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: Client,
    }

    impl HttpFetcher {
        pub fn new(options: &Options) -> Result<Self> {
            let client = Client::builder()
                .user_agent(options.user_agent.as_str())
                .timeout(options.fetch_timeout)
                .build()
                .map_err(|e| Error::Fetch(e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl Fetcher for HttpFetcher {
        fn fetch(&self, url: &str) -> Result<String> {
            let response = self
                .client
                .get(url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(|e| Error::Fetch(e.to_string()))?;

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let bytes = response.bytes().map_err(|e| Error::Fetch(e.to_string()))?;
            debug!(url = %url, bytes = bytes.len(), "fetched");

            Ok(transcode_to_utf8(&bytes, content_type.as_deref()))
        }
    }
}
