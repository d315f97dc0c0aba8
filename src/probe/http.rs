//! HTTP probe implementation.

use super::{ProbeError, Prober};
use crate::db::Outcome;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use std::error::Error as _;
use std::time::{Duration, Instant};

/// Query parameter appended to every probe URL to defeat caches.
pub const CACHE_BUST_PARAM: &str = "_pulse";

/// Prober issuing real GET requests through a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Build a prober. Without a timeout the transport default applies.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ProbeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProbeError::Request(describe(&e)))?;
        Ok(Self { client })
    }

    /// Issue the GET and return the response status code.
    async fn fetch_status(&self, url: Url) -> Result<u16, ProbeError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout
            } else if e.is_connect() {
                ProbeError::Connect(describe(&e))
            } else {
                ProbeError::Request(describe(&e))
            }
        })?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Outcome {
        let timestamp = Utc::now().timestamp_millis();
        let start = Instant::now();

        let result = match cache_busted_url(url, timestamp) {
            Ok(url) => self.fetch_status(url).await,
            Err(e) => Err(e),
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(code) => Outcome::response(timestamp, code, latency_ms),
            Err(e) => Outcome::error(timestamp, latency_ms, e.to_string()),
        }
    }
}

/// Append the cache-busting parameter, keeping any existing query.
pub fn cache_busted_url(url: &str, stamp: i64) -> Result<Url, ProbeError> {
    let mut parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
    parsed
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp.to_string());
    Ok(parsed)
}

/// Flatten an error and its sources into one line.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
