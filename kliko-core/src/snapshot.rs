//! Cache-aware retrieval of the embedded data block.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::cache::{SnapshotCache, default_ttl};
use crate::model::OperatorMeta;
use crate::ports::{FetchError, PayloadLocator, UpstreamPort};

/// Retrieves the operator page on a cache miss and keeps the located block.
pub struct SnapshotFetcher {
    upstream: Arc<dyn UpstreamPort>,
    locator: Arc<dyn PayloadLocator>,
    cache: Arc<SnapshotCache>,
    ttl: Duration,
}

impl SnapshotFetcher {
    /// Create a fetcher storing snapshots for the default lifetime.
    #[must_use]
    pub fn new(
        upstream: Arc<dyn UpstreamPort>,
        locator: Arc<dyn PayloadLocator>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            upstream,
            locator,
            cache,
            ttl: default_ttl(),
        }
    }

    /// Override how long a fetched snapshot stays fresh.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Operator whose page is fetched.
    #[must_use]
    pub fn operator(&self) -> &OperatorMeta {
        self.upstream.operator()
    }

    /// Return the current payload, fetching it if the cache has none.
    ///
    /// A cache hit never touches the network. The cache is written only after
    /// the block has been located, so an abandoned or failed fetch leaves the
    /// previous state untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request fails, the body is not UTF-8,
    /// or no recognisable block is present.
    pub async fn fetch_snapshot(&self) -> Result<Arc<str>, FetchError> {
        if let Some(snapshot) = self.cache.get() {
            debug!(
                created_at = %snapshot.created_at,
                expires_at = %snapshot.expires_at,
                "snapshot cache hit"
            );
            return Ok(snapshot.payload);
        }

        let operator = self.upstream.operator();
        debug!(operator = %operator.id.0, url = %operator.url, "snapshot cache miss");

        let body = self.upstream.fetch_document().await?;
        let document = String::from_utf8(body)?;

        let Some(payload) = self.locator.locate(&document) else {
            warn!(operator = %operator.id.0, "embedded container data not found");
            return Err(FetchError::NotFound);
        };

        let snapshot = self.cache.set(payload, self.ttl);
        debug!(bytes = snapshot.payload.len(), expires_at = %snapshot.expires_at, "snapshot stored");
        Ok(snapshot.payload)
    }
}
