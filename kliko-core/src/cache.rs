//! Single-slot, time-bounded store for the most recent upstream payload.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use crate::ports::Clock;

/// Lifetime of a cached snapshot in seconds.
pub const SNAPSHOT_TTL_SECS: i64 = 300;

/// Default lifetime of a cached snapshot.
#[must_use]
pub fn default_ttl() -> Duration {
    Duration::seconds(SNAPSHOT_TTL_SECS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw payload captured at one point in time.
pub struct Snapshot {
    /// Text of the embedded data block.
    pub payload: Arc<str>,
    /// When the payload was stored.
    pub created_at: DateTime<Utc>,
    /// First instant at which the payload is stale.
    pub expires_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether the snapshot may still be served at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Process-wide holder for the current snapshot.
///
/// Writes replace the whole slot under the lock, so readers see either the
/// previous snapshot or the new one.
pub struct SnapshotCache {
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<Snapshot>>,
}

impl SnapshotCache {
    /// Create an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached snapshot if it is still fresh.
    ///
    /// An expired snapshot is dropped from the slot.
    #[must_use]
    pub fn get(&self) -> Option<Snapshot> {
        let now = self.clock.now();
        {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                None => return None,
                Some(snapshot) if snapshot.is_fresh(now) => return Some(snapshot.clone()),
                Some(_) => {}
            }
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have published a fresh snapshot in between.
        if slot.as_ref().is_some_and(|snapshot| !snapshot.is_fresh(now)) {
            trace!("evicting expired snapshot");
            *slot = None;
        }
        slot.clone()
    }

    /// Store `payload`, expiring `ttl` from now.
    pub fn set(&self, payload: impl Into<Arc<str>>, ttl: Duration) -> Snapshot {
        let created_at = self.clock.now();
        let snapshot = Snapshot {
            payload: payload.into(),
            created_at,
            expires_at: created_at + ttl,
        };
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        snapshot
    }
}
