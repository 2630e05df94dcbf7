use super::metrics::{CacheMetrics, CacheStats};
use dashmap::DashMap;
use ferrous_analytics_domain::{DomainError, TimeRange};
use rustc_hash::FxBuildHasher;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Sliding TTL elapsed since the last access.
    Expired,
    /// Tracked range overlapped an invalidated range.
    Invalidated,
    /// Computation failed or was cancelled and no other caller was queued on the key.
    Abandoned,
    /// Idle slot without a value, reclaimed by a maintenance sweep.
    Purged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionEvent<K> {
    pub key: K,
    pub reason: EvictionReason,
}

struct Cached<V> {
    value: Arc<V>,
    range: TimeRange,
    ttl: Duration,
    last_access: Instant,
}

impl<V> Cached<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_access) >= self.ttl
    }
}

/// Everything the cache knows about one key: the value, the range it was
/// computed for and the lock serializing its computation live and die together.
struct Slot<V> {
    lock: Arc<Mutex<()>>,
    cached: Option<Cached<V>>,
}

impl<V> Slot<V> {
    fn vacant() -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            cached: None,
        }
    }

    /// Nobody outside the map holds or waits on the lock.
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.lock) == 1
    }
}

/// TTL cache with at most one in-flight computation per key.
///
/// Lookups of a fresh value never touch the per-key lock. On a miss the caller
/// takes the key's lock, re-checks, and only then computes; concurrent callers
/// for the same key wait on that lock and observe the computed value. Unrelated
/// keys never block each other.
///
/// Every removal goes through one eviction path that drops value, range and
/// lock together (the lock only when no caller holds it) and publishes an
/// [`EvictionEvent`].
pub struct SingleFlightCache<K, V> {
    name: &'static str,
    slots: DashMap<K, Slot<V>, FxBuildHasher>,
    events: broadcast::Sender<EvictionEvent<K>>,
    metrics: CacheMetrics,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            name,
            slots: DashMap::with_hasher(FxBuildHasher),
            events,
            metrics: CacheMetrics::default(),
        }
    }

    /// Returns the cached value for `key`, or runs `compute` once for all
    /// concurrent callers. `compute` yields the value and its sliding TTL.
    ///
    /// Failed or cancelled computations are not cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: K,
        range: TimeRange,
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<Arc<V>, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(V, Duration), DomainError>>,
    {
        if let Some(value) = self.lookup(&key) {
            CacheMetrics::bump(&self.metrics.hits);
            return Ok(value);
        }
        CacheMetrics::bump(&self.metrics.misses);

        let lock = self.lock_for(&key);
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            guard = Arc::clone(&lock).lock_owned() => Some(guard),
        };
        let Some(guard) = acquired else {
            self.abandon(&key, lock);
            return Err(DomainError::Cancelled);
        };

        if let Some(value) = self.lookup(&key) {
            CacheMetrics::bump(&self.metrics.coalesced);
            return Ok(value);
        }

        CacheMetrics::bump(&self.metrics.computations);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::Cancelled),
            result = compute() => result,
        };

        match outcome {
            Ok((value, ttl)) => {
                let value = Arc::new(value);
                self.install(
                    key,
                    &lock,
                    Cached {
                        value: Arc::clone(&value),
                        range,
                        ttl,
                        last_access: Instant::now(),
                    },
                );
                drop(guard);
                Ok(value)
            }
            Err(e) => {
                CacheMetrics::bump(&self.metrics.failures);
                drop(guard);
                self.abandon(&key, lock);
                Err(e)
            }
        }
    }

    /// Drops every entry whose tracked range strictly overlaps `range`.
    pub fn invalidate(&self, range: &TimeRange) -> usize {
        let keys: Vec<K> = self
            .slots
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .cached
                    .as_ref()
                    .is_some_and(|c| c.range.overlaps(range))
            })
            .map(|entry| entry.key().clone())
            .collect();

        let removed = keys
            .iter()
            .filter(|key| {
                self.evict_where(key, EvictionReason::Invalidated, |c| {
                    c.range.overlaps(range)
                })
            })
            .count();

        if removed > 0 {
            debug!(cache = self.name, removed, range = %range, "Cache entries invalidated");
        }
        removed
    }

    /// Removes expired values and idle slots that hold no value.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();
        let mut orphaned = Vec::new();

        for entry in self.slots.iter() {
            match &entry.value().cached {
                Some(cached) if cached.is_expired(now) => expired.push(entry.key().clone()),
                None if entry.value().is_idle() => orphaned.push(entry.key().clone()),
                _ => {}
            }
        }

        let mut removed = 0;
        for key in expired {
            if self.evict_where(&key, EvictionReason::Expired, |c| c.is_expired(now)) {
                removed += 1;
            }
        }
        for key in orphaned {
            if self
                .slots
                .remove_if(&key, |_, slot| slot.cached.is_none() && slot.is_idle())
                .is_some()
            {
                self.emit(key, EvictionReason::Purged);
                removed += 1;
            }
        }

        removed
    }

    /// Fresh value for `key` without computing or refreshing its TTL.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let now = Instant::now();
        self.slots.get(key).and_then(|slot| {
            slot.cached
                .as_ref()
                .filter(|c| !c.is_expired(now))
                .map(|c| Arc::clone(&c.value))
        })
    }

    pub fn tracked_range(&self, key: &K) -> Option<TimeRange> {
        self.slots
            .get(key)
            .and_then(|slot| slot.cached.as_ref().map(|c| c.range))
    }

    /// Entries currently holding a value.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().cached.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots including those that only hold a lock.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EvictionEvent<K>> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    fn lookup(&self, key: &K) -> Option<Arc<V>> {
        let now = Instant::now();
        {
            let mut slot = self.slots.get_mut(key)?;
            match slot.cached.as_mut() {
                Some(cached) if !cached.is_expired(now) => {
                    cached.last_access = now;
                    return Some(Arc::clone(&cached.value));
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.evict_where(key, EvictionReason::Expired, |c| c.is_expired(now));
        None
    }

    fn lock_for(&self, key: &K) -> Arc<Mutex<()>> {
        Arc::clone(
            &self
                .slots
                .entry(key.clone())
                .or_insert_with(Slot::vacant)
                .lock,
        )
    }

    fn install(&self, key: K, lock: &Arc<Mutex<()>>, cached: Cached<V>) {
        debug!(cache = self.name, key = ?key, ttl_secs = cached.ttl.as_secs(), "Cache entry stored");
        let mut slot = self.slots.entry(key).or_insert_with(|| Slot {
            lock: Arc::clone(lock),
            cached: None,
        });
        slot.cached = Some(cached);
        CacheMetrics::bump(&self.metrics.insertions);
    }

    /// Drops the slot of a failed computation unless someone else is queued on it.
    ///
    /// Two references means the map and `lock` itself: no holder, no waiter.
    /// A queued waiter keeps the slot and will recompute.
    fn abandon(&self, key: &K, lock: Arc<Mutex<()>>) {
        let removed = self.slots.remove_if(key, |_, slot| {
            slot.cached.is_none()
                && Arc::ptr_eq(&slot.lock, &lock)
                && Arc::strong_count(&slot.lock) == 2
        });
        drop(lock);

        if removed.is_some() {
            self.emit(key.clone(), EvictionReason::Abandoned);
        }
    }

    /// Single eviction path.
    ///
    /// An idle slot is removed whole. A slot whose lock is held or awaited
    /// keeps its lock and only loses the value; the lock holder owns it.
    fn evict_where<P>(&self, key: &K, reason: EvictionReason, matches: P) -> bool
    where
        P: Fn(&Cached<V>) -> bool,
    {
        let removed = self.slots.remove_if(key, |_, slot| {
            slot.is_idle() && slot.cached.as_ref().is_some_and(&matches)
        });
        if removed.is_some() {
            self.emit(key.clone(), reason);
            return true;
        }

        let mut evicted = false;
        if let Some(mut slot) = self.slots.get_mut(key) {
            if slot.cached.as_ref().is_some_and(&matches) {
                slot.cached = None;
                evicted = true;
            }
        }
        if evicted {
            self.emit(key.clone(), reason);
        }
        evicted
    }

    fn emit(&self, key: K, reason: EvictionReason) {
        CacheMetrics::bump(&self.metrics.evictions);
        debug!(cache = self.name, key = ?key, reason = ?reason, "Cache entry evicted");
        let _ = self.events.send(EvictionEvent { key, reason });
    }
}
