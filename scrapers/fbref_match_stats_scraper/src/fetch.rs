use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use std::time::Duration;
use tracing::info;

use crate::{config::ScrapingConfig, error::FetchError};

pub trait HtmlFetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

pub struct WebHtmlFetcher {
    client: reqwest::blocking::Client,
}

impl WebHtmlFetcher {
    pub fn new(config: &ScrapingConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

impl HtmlFetcher for WebHtmlFetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(network)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().map_err(network)?;
        info!("Downloaded {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> WebHtmlFetcher {
        WebHtmlFetcher::new(&ScrapingConfig::default()).unwrap()
    }

    #[test]
    fn test_fetch_success_sends_browser_headers() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/en/matches/07f058d4/Dinamo-Zagreb-Chelsea")
            .match_header("accept-language", "en-US,en;q=0.9")
            .match_header("user-agent", mockito::Matcher::Regex("Mozilla".to_string()))
            .with_status(200)
            .with_body("<html><body>ok</body></html>")
            .create();

        let html = fetcher()
            .fetch_html(&format!("{}/en/matches/07f058d4/Dinamo-Zagreb-Chelsea", server.url()))
            .unwrap();

        assert!(html.contains("ok"));
        mock.assert();
    }

    #[test]
    fn test_fetch_non_success_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing").with_status(429).create();

        let err = fetcher()
            .fetch_html(&format!("{}/missing", server.url()))
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 429, .. }));
    }

    #[test]
    fn test_fetch_network_error() {
        let err = fetcher().fetch_html("http://127.0.0.1:1/unreachable").unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
