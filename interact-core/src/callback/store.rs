//! `src/callback/store.rs`
//! ============================================================================
//! # Ephemeral Callback Store
//!
//! A moka-backed, lock-free cache of [`CallbackEntry`] values keyed by short
//! random ids:
//! - per-entry TTL taken from the entry itself, never extended by reads
//! - bounded size with TinyLFU eviction
//! - at-most-N invocation accounting with eviction on the last claim
//! - a removal hook that disables the stale components of a message through
//!   a host-supplied [`ComponentDisabler`], detached and best-effort

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use compact_str::{CompactString, ToCompactString};
use enum_map::{Enum, EnumMap};
use moka::{Expiry, future::Cache, notification::RemovalCause};
use nanoid::nanoid;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use super::entry::CallbackEntry;
use crate::{
    config::CallbackConfig,
    event::{ComponentDisabler, MessageLocation},
};

/// Generated callback identity; the `identity` segment of a `cb:` id.
pub type CallbackId = CompactString;

/// Length of generated callback ids.
pub const CALLBACK_ID_LENGTH: usize = 8;

const ID_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];

/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum EvictionCause {
    /// TTL elapsed
    Expired,

    /// Evicted to respect `max_size`
    Size,

    /// Removed through `remove` / `invalidate` / `clear`
    Explicit,

    /// Last allowed invocation was claimed
    Exhausted,
}

impl EvictionCause {
    fn from_removal(cause: RemovalCause, entry: &CallbackEntry) -> Option<Self> {
        match cause {
            RemovalCause::Expired => Some(Self::Expired),
            RemovalCause::Size => Some(Self::Size),
            RemovalCause::Explicit if entry.is_exhausted() => Some(Self::Exhausted),
            RemovalCause::Explicit => Some(Self::Explicit),
            // ids are never reused, so replacement does not retire an entry
            RemovalCause::Replaced => None,
        }
    }

    /// Removed by the cache itself rather than by a caller.
    #[must_use]
    pub const fn was_evicted(self) -> bool {
        matches!(self, Self::Expired | Self::Size)
    }
}

/// Store statistics for monitoring and debugging
#[derive(Debug, Default)]
pub struct CallbackStats {
    registered: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    id_collisions: AtomicU64,
    evictions: EnumMap<EvictionCause, AtomicU64>,
    disable_attempts: AtomicU64,
    disable_failures: AtomicU64,
}

impl CallbackStats {
    fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self, cause: EvictionCause) {
        Self::record(&self.evictions[cause]);
    }

    pub fn snapshot(&self) -> CallbackStatsSnapshot {
        CallbackStatsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            id_collisions: self.id_collisions.load(Ordering::Relaxed),
            evictions: EnumMap::from_fn(|cause| self.evictions[cause].load(Ordering::Relaxed)),
            disable_attempts: self.disable_attempts.load(Ordering::Relaxed),
            disable_failures: self.disable_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallbackStatsSnapshot {
    pub registered: u64,
    pub hits: u64,
    pub misses: u64,
    pub id_collisions: u64,
    pub evictions: EnumMap<EvictionCause, u64>,
    pub disable_attempts: u64,
    pub disable_failures: u64,
}

impl CallbackStatsSnapshot {
    #[must_use]
    pub fn evicted(&self, cause: EvictionCause) -> u64 {
        self.evictions[cause]
    }
}

/// Deferred slot for the gateway-backed disabler; empty until the host
/// connection exists.
type DisablerSlot = Arc<RwLock<Option<Arc<dyn ComponentDisabler>>>>;

/// Expiry taken from each entry's own TTL. Reads and updates keep the
/// remaining duration, so access never extends a callback's life.
struct CallbackExpiry;

impl Expiry<CallbackId, Arc<CallbackEntry>> for CallbackExpiry {
    fn expire_after_create(
        &self,
        _key: &CallbackId,
        value: &Arc<CallbackEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl())
    }
}

/// Removal hook shared with the cache's eviction listener.
struct EvictionHook {
    log_expirations: bool,
    disable_on_expire: bool,
    disable_timeout: Duration,
    stats: Arc<CallbackStats>,
    disabler: DisablerSlot,
}

impl EvictionHook {
    fn on_removal(&self, key: &CallbackId, entry: &CallbackEntry, cause: RemovalCause) {
        let Some(cause) = EvictionCause::from_removal(cause, entry) else {
            return;
        };
        self.stats.record_eviction(cause);

        if self.log_expirations && cause.was_evicted() {
            debug!(
                marker = "CALLBACK_STORE",
                operation_type = "callback_evicted",
                callback_id = %key,
                cause = ?cause,
                location = ?entry.location(),
                "Callback expired"
            );
        }

        if self.disable_on_expire
            && let Some(location) = entry.location()
        {
            self.spawn_disable(key, location);
        }
    }

    fn spawn_disable(&self, key: &CallbackId, location: MessageLocation) {
        let Some(disabler) = self.disabler.read().clone() else {
            warn!(
                callback_id = %key,
                %location,
                "Cannot disable components: gateway not available"
            );
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                callback_id = %key,
                %location,
                "Cannot disable components: no async runtime on the evicting thread"
            );
            return;
        };

        CallbackStats::record(&self.stats.disable_attempts);
        let stats = Arc::clone(&self.stats);
        let timeout = self.disable_timeout;
        let key = key.clone();

        runtime.spawn(async move {
            match tokio::time::timeout(timeout, disabler.disable_at(location)).await {
                Ok(Ok(())) => {
                    debug!(callback_id = %key, %location, "Disabled components");
                }
                Ok(Err(e)) => {
                    CallbackStats::record(&stats.disable_failures);
                    warn!(callback_id = %key, %location, error = %e, "Failed to disable components");
                }
                Err(_) => {
                    CallbackStats::record(&stats.disable_failures);
                    warn!(
                        callback_id = %key,
                        %location,
                        timeout_ms = timeout.as_millis() as u64,
                        "Disabling components timed out"
                    );
                }
            }
        });
    }
}

/// Concurrent store of ephemeral callbacks. Cloning shares the same cache.
#[derive(Clone)]
pub struct CallbackStore {
    inner: Cache<CallbackId, Arc<CallbackEntry>>,
    config: Arc<CallbackConfig>,
    stats: Arc<CallbackStats>,
    disabler: DisablerSlot,
}

impl CallbackStore {
    #[must_use]
    pub fn new(config: CallbackConfig) -> Self {
        let stats = Arc::new(CallbackStats::default());
        let disabler: DisablerSlot = Arc::new(RwLock::new(None));

        let hook = EvictionHook {
            log_expirations: config.log_expirations,
            disable_on_expire: config.disable_on_expire,
            disable_timeout: config.disable_timeout,
            stats: Arc::clone(&stats),
            disabler: Arc::clone(&disabler),
        };

        let inner = Cache::builder()
            .max_capacity(config.max_size)
            .expire_after(CallbackExpiry)
            .eviction_listener(move |key: Arc<CallbackId>, entry: Arc<CallbackEntry>, cause| {
                hook.on_removal(&key, &entry, cause);
            })
            .build();

        info!(
            default_ttl = ?config.default_ttl,
            max_size = config.max_size,
            "Initialized callback store"
        );

        Self {
            inner,
            config: Arc::new(config),
            stats,
            disabler,
        }
    }

    /// Store with an already available disabler.
    #[must_use]
    pub fn with_disabler(config: CallbackConfig, disabler: Arc<dyn ComponentDisabler>) -> Self {
        let store = Self::new(config);
        store.set_disabler(disabler);
        store
    }

    /// Supply the disabler once the gateway connection is up.
    pub fn set_disabler(&self, disabler: Arc<dyn ComponentDisabler>) {
        *self.disabler.write() = Some(disabler);
    }

    #[must_use]
    pub fn config(&self) -> &CallbackConfig {
        &self.config
    }

    /// Store `entry` under a fresh id and return the id.
    #[instrument(skip(self, entry), fields(ttl = ?entry.ttl(), max_invocations = entry.max_invocations()))]
    pub async fn register(&self, entry: CallbackEntry) -> CallbackId {
        let entry = Arc::new(entry);

        loop {
            let id: CallbackId = nanoid!(CALLBACK_ID_LENGTH, &ID_ALPHABET).to_compact_string();
            let value = Arc::clone(&entry);
            let inserted = self
                .inner
                .entry(id.clone())
                .or_insert_with(async move { value })
                .await;

            if inserted.is_fresh() {
                CallbackStats::record(&self.stats.registered);
                debug!(
                    marker = "CALLBACK_STORE",
                    operation_type = "callback_registered",
                    callback_id = %id,
                    has_location = entry.location().is_some(),
                    "Registered callback"
                );
                return id;
            }

            CallbackStats::record(&self.stats.id_collisions);
            warn!(callback_id = %id, "Generated callback id already in use, retrying");
        }
    }

    /// Resolve a live callback, claiming one invocation if it is bounded.
    ///
    /// The claim that reaches the bound removes the entry before returning;
    /// callers racing past the bound get `None`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Option<Arc<CallbackEntry>> {
        let Some(entry) = self.inner.get(id).await else {
            CallbackStats::record(&self.stats.misses);
            debug!(
                marker = "CALLBACK_STORE",
                operation_type = "callback_miss",
                callback_id = id,
                "Callback not found or expired"
            );
            return None;
        };

        let max = entry.max_invocations();
        if max > 0 {
            let Some(count) = entry.try_claim() else {
                CallbackStats::record(&self.stats.misses);
                return None;
            };

            if count >= max {
                entry.mark_exhausted();
                self.inner.invalidate(id).await;
                debug!(
                    marker = "CALLBACK_STORE",
                    operation_type = "callback_exhausted",
                    callback_id = id,
                    max_invocations = max,
                    "Callback reached max invocations, removed"
                );
            }
        }

        CallbackStats::record(&self.stats.hits);
        Some(entry)
    }

    /// Remove a callback; `false` if it was already gone or had expired.
    ///
    /// moka hands back an expired entry until its eviction runs, so the TTL
    /// is checked on what comes out.
    pub async fn remove(&self, id: &str) -> bool {
        self.inner
            .remove(id)
            .await
            .is_some_and(|entry| !entry.remaining_time().is_zero())
    }

    /// Approximate number of live entries; exact after `run_pending_tasks`.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
        info!("Callback store cleared");
    }

    /// Run pending expiry and eviction work now.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    #[must_use]
    pub fn stats(&self) -> CallbackStatsSnapshot {
        self.stats.snapshot()
    }
}

impl fmt::Debug for CallbackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackStore")
            .field("config", &self.config)
            .field("entry_count", &self.size())
            .finish_non_exhaustive()
    }
}
