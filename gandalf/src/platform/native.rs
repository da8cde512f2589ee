//! HTTP access to remote resources.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};

use crate::error::GandalfError;
use crate::platform::PlatformService;

/// User agent sent with feed requests unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("gandalf/", env!("CARGO_PKG_VERSION"));

/// Platform service loading resources over HTTP.
#[derive(Debug, Clone)]
pub struct NativePlatformService {
    http_client: reqwest::Client,
}

impl NativePlatformService {
    /// Creates a new service with the default user agent and no request timeout.
    pub fn new() -> Result<Self, GandalfError> {
        Self::with_settings(DEFAULT_USER_AGENT, None)
    }

    /// Creates a new service. Without a timeout a hung request never completes.
    pub fn with_settings(
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, GandalfError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|err| GandalfError::Configuration(format!("http client: {err}")))?;

        Ok(Self { http_client })
    }

    async fn load_from_web(&self, url: &str) -> Result<Bytes, GandalfError> {
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            info!("Failed to load {url}: {status}");
            debug!("Response body: {:?}", response.text().await);
            return Err(GandalfError::FeedUnavailable {
                url: url.to_string(),
                reason: status.to_string(),
            });
        }

        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl PlatformService for NativePlatformService {
    async fn load_bytes_from_url(&self, url: &str) -> Result<Bytes, GandalfError> {
        self.load_from_web(url).await
    }
}
