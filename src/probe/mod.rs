//! Probe module for endpoint health checks.
//!
//! A probe is a single HTTP GET against a target URL. Failures never escape
//! as errors: every attempt ends in an [`Outcome`].

mod http;

pub use http::*;

use crate::db::Outcome;
use async_trait::async_trait;
use thiserror::Error;

/// Reasons a probe could not obtain a response.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// Runs one health check against a URL.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Outcome;
}
