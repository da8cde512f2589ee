//! Provides the network seam of the crate and [`PlatformService`] to access it.

use ahash::{HashMap, HashMapExt};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::GandalfError;

pub mod native;

/// Service providing access to remote resources in a generic way.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Loads a byte array from the given url.
    async fn load_bytes_from_url(&self, url: &str) -> Result<Bytes, GandalfError>;
}

/// Default implementation of the [`PlatformService`] for the current platform.
pub type PlatformServiceImpl = native::NativePlatformService;

/// Platform service that serves documents from memory.
///
/// Used to replay recorded feeds and in tests. Every requested url is recorded, so the caller can
/// check what was fetched and in which order.
#[derive(Debug, Default)]
pub struct MemoryPlatformService {
    documents: HashMap<String, Bytes>,
    failing: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryPlatformService {
    /// Creates an empty service. Every request fails until documents are added.
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            failing: HashMap::new(),
            requests: Mutex::new(vec![]),
        }
    }

    /// Serves `body` at `url`.
    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }

    /// Makes requests to `url` fail with the given reason.
    pub fn with_failure(mut self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failing.insert(url.into(), reason.into());
        self
    }

    /// Urls requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PlatformService for MemoryPlatformService {
    async fn load_bytes_from_url(&self, url: &str) -> Result<Bytes, GandalfError> {
        self.requests.lock().push(url.to_string());

        if let Some(reason) = self.failing.get(url) {
            return Err(GandalfError::FeedUnavailable {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }

        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| GandalfError::FeedUnavailable {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })
    }
}
