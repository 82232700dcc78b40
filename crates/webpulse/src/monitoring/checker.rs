use anyhow::{Result, anyhow};
use std::time::{Duration, Instant};
use url::Url;

/// Checker trait for liveness probes
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Issue one request and return latency in milliseconds and the status code.
    ///
    /// Any status code is `Ok`; only transport failures are errors.
    async fn check(&self, target: &str) -> Result<(u64, u16)>;
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    /// Build a checker whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &str) -> Result<(u64, u16)> {
        let url = Url::parse(target).map_err(|e| anyhow!("Invalid probe target {}: {}", target, e))?;
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        let latency = start.elapsed().as_millis() as u64;
        Ok((latency, response.status().as_u16()))
    }
}
