//! High-level service facade answering nearby-container queries.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::cache::SnapshotCache;
use crate::extract::RecordExtractor;
use crate::geo::{containers_within_radius, resolve_coordinates};
use crate::model::{NeighborResult, OperatorMeta, RegistrationNumber};
use crate::plugin::OperatorPlugin;
use crate::ports::QueryError;
use crate::snapshot::SnapshotFetcher;

/// Radius used when the caller does not supply one, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 0.15;

/// Public entry point for proximity queries.
pub struct QueryService {
    fetcher: SnapshotFetcher,
    extractor: RecordExtractor,
}

impl QueryService {
    /// Create a new service from its parts.
    #[must_use]
    pub fn new(fetcher: SnapshotFetcher, extractor: RecordExtractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Wire a service for `plugin`, sharing `cache` and keeping snapshots for `ttl`.
    #[must_use]
    pub fn from_plugin(plugin: &OperatorPlugin, cache: Arc<SnapshotCache>, ttl: Duration) -> Self {
        let fetcher = SnapshotFetcher::new(
            Arc::clone(&plugin.upstream),
            Arc::new(plugin.locator()),
            cache,
        )
        .with_ttl(ttl);
        Self::new(fetcher, plugin.extractor())
    }

    /// Operator answering the queries.
    #[must_use]
    pub fn operator(&self) -> &OperatorMeta {
        self.fetcher.operator()
    }

    /// List every container within `radius_km` of the container with id `reference`.
    ///
    /// The reference container is part of its own result. Results keep the
    /// order of the upstream data.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the radius is invalid, the snapshot cannot
    /// be fetched or decoded, or the reference container is unknown or has no
    /// coordinates.
    pub async fn handle_query(
        &self,
        reference: u64,
        radius_km: f64,
    ) -> Result<Vec<NeighborResult>, QueryError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(QueryError::InvalidRadius(radius_km));
        }

        let payload = self.fetcher.fetch_snapshot().await.inspect_err(|err| {
            warn!(error = %err, "snapshot unavailable");
        })?;
        let records = self.extractor.extract(&payload).inspect_err(|err| {
            warn!(error = %err, "snapshot could not be decoded");
        })?;

        let reference = RegistrationNumber::from_id(reference);
        let center = resolve_coordinates(&records.containers, &reference)
            .ok_or(QueryError::ReferenceNotFound(reference))?;

        let neighbors: Vec<_> =
            containers_within_radius(&records.containers, center, radius_km).collect();
        debug!(
            count = neighbors.len(),
            radius_km,
            latitude = center.latitude,
            longitude = center.longitude,
            "neighbours found"
        );
        Ok(neighbors)
    }
}
