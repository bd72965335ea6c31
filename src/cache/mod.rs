//! Time-based cache with pluggable load, in-use and removal policy
//!
//! Entries expire `retention` after their last `get`/`put`. Expiry is
//! lazy: every public operation first sweeps entries whose deadline has
//! passed. For each one the policy decides whether it is still in use (the
//! deadline is re-armed) or can be evicted (the value is handed to
//! [`CachePolicy::on_removal`]). There is no background thread.
//!
//! The cache holds no domain knowledge. Callers pass their policy into each
//! operation, which lets the policy borrow state owned next to the cache.

pub mod clock;

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use clock::{Clock, ManualClock, SystemClock};

use crate::constants::MIN_RETENTION;

/// Errors raised while building a cache
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache retention {requested:?} is below the minimum of {minimum:?}")]
    RetentionTooShort { requested: Duration, minimum: Duration },
}

/// Domain hooks consulted by [`Cache`]
///
/// Every method has a neutral default, so a policy only overrides what it
/// needs. `()` is the policy with no hooks at all.
pub trait CachePolicy<K, V> {
    /// Produce a value on a miss. `None` leaves the key absent.
    fn load(&mut self, _key: &K, _create: bool) -> Option<V> {
        None
    }

    /// Whether an expired entry must stay resident
    fn in_use(&mut self, _key: &K, _value: &mut V) -> bool {
        false
    }

    /// Called exactly once with each evicted value
    fn on_removal(&mut self, _key: K, _value: V) {}
}

impl<K, V> CachePolicy<K, V> for () {}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    expires_at: Instant,
    sequence: u64,
}

/// Key/value store with per-entry expiry
pub struct Cache<K, V> {
    entries: FxHashMap<K, Slot<V>>,
    /// Expiry index. The sequence number makes deadlines unique so each key
    /// occupies exactly one slot.
    expiry: BTreeMap<(Instant, u64), K>,
    sequence: u64,
    retention: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache reading the system clock
    pub fn new(retention: Duration) -> Result<Self, CacheError> {
        Self::with_clock(retention, Arc::new(SystemClock))
    }

    /// Create a cache reading the given clock
    pub fn with_clock(retention: Duration, clock: Arc<dyn Clock>) -> Result<Self, CacheError> {
        if retention < MIN_RETENTION {
            return Err(CacheError::RetentionTooShort {
                requested: retention,
                minimum: MIN_RETENTION,
            });
        }

        Ok(Self {
            entries: FxHashMap::default(),
            expiry: BTreeMap::new(),
            sequence: 0,
            retention,
            clock,
        })
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Store a value and re-arm its expiry. A `None` value is ignored.
    pub fn put<P>(&mut self, key: K, value: Option<V>, policy: &mut P)
    where
        P: CachePolicy<K, V>,
    {
        self.sweep(policy);
        let Some(value) = value else {
            return;
        };

        let now = self.clock.now();
        match self.entries.get_mut(&key) {
            Some(slot) => {
                slot.value = value;
                self.arm(&key, now);
            }
            None => self.insert(key, value, now),
        }
    }

    /// Fetch a value, loading it through the policy on a miss
    ///
    /// A loader returning `None` caches nothing, so the next miss asks the
    /// loader again.
    pub fn get<P>(&mut self, key: &K, create: bool, policy: &mut P) -> Option<&mut V>
    where
        P: CachePolicy<K, V>,
    {
        self.sweep(policy);
        let now = self.clock.now();

        if self.entries.contains_key(key) {
            self.arm(key, now);
        } else {
            let value = policy.load(key, create)?;
            self.insert(key.clone(), value, now);
        }

        self.entries.get_mut(key).map(|slot| &mut slot.value)
    }

    /// Whether a key is resident once expired entries have been swept
    pub fn contains_key<P>(&mut self, key: &K, policy: &mut P) -> bool
    where
        P: CachePolicy<K, V>,
    {
        self.sweep(policy);
        self.entries.contains_key(key)
    }

    /// Drop a key without running [`CachePolicy::on_removal`]
    pub fn invalidate<P>(&mut self, key: &K, policy: &mut P) -> Option<V>
    where
        P: CachePolicy<K, V>,
    {
        self.sweep(policy);
        let slot = self.entries.remove(key)?;
        self.expiry.remove(&(slot.expires_at, slot.sequence));
        Some(slot.value)
    }

    /// Expire every entry now and sweep, so each one goes through the
    /// in-use check and, if unused, removal
    pub fn expire_all<P>(&mut self, policy: &mut P)
    where
        P: CachePolicy<K, V>,
    {
        let now = self.clock.now();
        let keys: Vec<K> = self.entries.keys().cloned().collect();
        for key in keys {
            self.schedule(&key, now);
        }
        self.sweep(policy);
    }

    /// Look at a resident value without sweeping or re-arming its expiry
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep<P>(&mut self, policy: &mut P)
    where
        P: CachePolicy<K, V>,
    {
        let now = self.clock.now();

        let mut expired = Vec::new();
        while let Some(entry) = self.expiry.first_entry() {
            if entry.key().0 > now {
                break;
            }
            expired.push(entry.remove());
        }

        for key in expired {
            let Some(slot) = self.entries.get_mut(&key) else {
                continue;
            };

            if policy.in_use(&key, &mut slot.value) {
                self.sequence += 1;
                slot.expires_at = now + self.retention;
                slot.sequence = self.sequence;
                self.expiry.insert((slot.expires_at, slot.sequence), key);
            } else if let Some(slot) = self.entries.remove(&key) {
                policy.on_removal(key, slot.value);
            }
        }
    }

    fn insert(&mut self, key: K, value: V, now: Instant) {
        self.sequence += 1;
        let slot = Slot {
            value,
            expires_at: now + self.retention,
            sequence: self.sequence,
        };
        self.expiry.insert((slot.expires_at, slot.sequence), key.clone());
        self.entries.insert(key, slot);
    }

    fn arm(&mut self, key: &K, now: Instant) {
        self.schedule(key, now + self.retention);
    }

    /// Move a resident key to a new deadline
    fn schedule(&mut self, key: &K, deadline: Instant) {
        let Some(slot) = self.entries.get_mut(key) else {
            return;
        };
        self.expiry.remove(&(slot.expires_at, slot.sequence));
        self.sequence += 1;
        slot.expires_at = deadline;
        slot.sequence = self.sequence;
        self.expiry.insert((deadline, slot.sequence), key.clone());
    }
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("entries", &self.entries.len())
            .field("retention", &self.retention)
            .finish()
    }
}
