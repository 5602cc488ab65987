//! Blocking HTTP fetch capability.
//!
//! Every remote call the resolver makes is a single GET returning the whole
//! body. [`Transport`] is the seam: [`HttpTransport`] is the real client and
//! tests substitute a scripted one.

use std::time::Duration;
use thiserror::Error;

use crate::config::HttpConfig;
use crate::error::{ResolveError, Result};

/// A failed GET.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("GET {url}: {reason}")]
pub struct TransportError {
    pub url: String,
    pub reason: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Fetch the body at a URL. Single attempt, no retry.
pub trait Transport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

/// [`Transport`] backed by `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ResolveError::ClientSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::new(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| TransportError::new(url, e.to_string()))?;
        let bytes = resp
            .bytes()
            .map_err(|e| TransportError::new(url, format!("read body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
