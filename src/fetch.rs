use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::error::{Error, Result};

/// Anything that can turn a URL into a raw document body.
///
/// Headers, proxies and timeouts are the implementation's business; callers
/// only see the body or an `Error::Fetch`.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// Desktop browser strings rotated per request. Some lyric sites refuse
// obvious bot agents.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.88 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:119.0) Gecko/20100101 Firefox/119.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15",
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// `reqwest`-backed fetcher with a random user agent per request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::user_agent())
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| describe(url, &e))?;

        let body = response.text().await.map_err(|e| describe(url, &e))?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

fn describe(url: &str, e: &reqwest::Error) -> Error {
    let mut message = e.to_string();
    if let Some(status) = e.status() {
        if status == reqwest::StatusCode::NOT_FOUND {
            message.push_str(" (page not found)");
        } else if status.is_client_error() || status.is_server_error() {
            message.push_str(&format!(" (HTTP {status}, the site may be blocking requests)"));
        }
    } else if e.is_timeout() {
        message.push_str(" (request timed out)");
    }
    Error::fetch(url, message)
}
