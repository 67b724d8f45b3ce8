use crate::error::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Keyed artifact store. Implementations must make each `set` visible
/// atomically: a reader sees the previous value or the new one, never a mix.
pub trait CacheStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<V>>;

    fn set(&self, key: &str, value: V) -> Result<()>;

    /// Extends the entry's lifetime without reading it. Returns false on a miss.
    fn touch(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory store with sliding expiration: every hit pushes the expiry out by `ttl`.
///
/// Writes sweep expired entries at most once per `ttl`, so keys that are never
/// read again do not pile up.
pub struct TtlStore<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    next_sweep: Mutex<Instant>,
}

impl<V> TtlStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            next_sweep: Mutex::new(Instant::now() + ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    fn sweep_if_due(&self) {
        let now = Instant::now();
        {
            let mut next = self.next_sweep.lock();
            if now < *next {
                return;
            }
            *next = now + self.ttl;
        }
        self.purge_expired();
    }

    fn refresh(&self, key: &str) -> Option<dashmap::mapref::one::RefMut<'_, String, CacheEntry<V>>> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.expires_at > now => {
                entry.expires_at = now + self.ttl;
                Some(entry)
            }
            Some(entry) => {
                drop(entry);
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                None
            }
            None => None,
        }
    }
}

impl<V> Default for TtlStore<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V: Clone + Send + Sync> CacheStore<V> for TtlStore<V> {
    fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.refresh(key).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.sweep_if_due();
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn touch(&self, key: &str) -> Result<bool> {
        Ok(self.refresh(key).is_some())
    }
}

/// Store that never holds anything; every lookup rebuilds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl<V> CacheStore<V> for NullStore {
    fn get(&self, _key: &str) -> Result<Option<V>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: V) -> Result<()> {
        Ok(())
    }

    fn touch(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_hit_returns_same_value_and_slides_expiry() {
        let store = TtlStore::new(Duration::from_secs(10));
        let value = Arc::new("graph".to_string());
        store.set("k", value.clone()).unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        let hit = store.get("k").unwrap().unwrap();
        assert!(Arc::ptr_eq(&hit, &value));

        // 16s after set, but only 8s after the last hit
        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(store.get("k").unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_without_access() {
        let store = TtlStore::new(Duration::from_secs(10));
        store.set("k", 1u32).unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_extends_lifetime() {
        let store = TtlStore::new(Duration::from_secs(10));
        store.set("k", 1u32).unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.touch("k").unwrap());
        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("k").unwrap(), Some(1));
        assert!(!store.touch("missing").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = TtlStore::new(Duration::from_secs(5));
        store.set("a", 1u32).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        store.set("b", 2u32).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        store.purge_expired();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b").unwrap(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_sweeps_abandoned_keys() {
        let store = TtlStore::new(Duration::from_secs(10));
        for i in 0..1000u32 {
            store.set(&format!("schema-{}", i), i).unwrap();
        }
        assert_eq!(store.len(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        store.set("fresh", 0).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fresh").unwrap(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_before_sweep_is_due_keeps_entries() {
        let store = TtlStore::new(Duration::from_secs(10));
        store.set("a", 1u32).unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        store.set("b", 2u32).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        store.set("c", 3u32).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_null_store_never_hits() {
        let store = NullStore;
        CacheStore::<u32>::set(&store, "k", 1).unwrap();
        assert_eq!(CacheStore::<u32>::get(&store, "k").unwrap(), None);
    }
}
