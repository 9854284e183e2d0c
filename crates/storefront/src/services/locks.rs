//! Per-user serialization of cart and checkout operations.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use emporium_core::UserId;

/// Idle time before an unused lock is dropped.
const DEFAULT_IDLE: Duration = Duration::from_secs(600); // 10 minutes

/// Async mutexes keyed by user.
///
/// Cart mutations and checkouts for one user run one at a time within this
/// process, so a checkout never interleaves with an add or another checkout.
///
/// The cache has no size bound, so entries are never evicted or refused
/// for capacity. They only expire after sitting idle longer than the
/// deadline of any operation that holds them, and a guard never outlives
/// its deadline, so a held lock cannot be replaced by a fresh one.
#[derive(Clone)]
pub struct UserLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
    idle: Duration,
}

impl UserLocks {
    /// Create the lock table with the default idle expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle(DEFAULT_IDLE)
    }

    /// Create a lock table for operations bounded by `deadline`.
    ///
    /// Idle expiry is at least twice the deadline.
    #[must_use]
    pub fn for_deadline(deadline: Duration) -> Self {
        Self::with_idle(DEFAULT_IDLE.max(deadline.saturating_mul(2)))
    }

    fn with_idle(idle: Duration) -> Self {
        let locks = Cache::builder().time_to_idle(idle).build();
        Self { locks, idle }
    }

    /// How long an unused lock is kept.
    #[must_use]
    pub const fn idle(&self) -> Duration {
        self.idle
    }

    /// Wait for exclusive access to the user's cart.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(user_id, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UserLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLocks")
            .field("entries", &self.locks.entry_count())
            .field("idle", &self.idle)
            .finish()
    }
}
