use super::store::{CacheStore, NullStore, TtlStore};
use crate::error::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// One cache concern (descriptors, types or schemas) in front of a
/// [`CacheStore`]. Store failures are logged and treated as misses, and
/// concurrent builds of the same key collapse into one construction.
#[derive(Clone)]
pub struct CacheLayer<V> {
    name: &'static str,
    store: Option<Arc<dyn CacheStore<V>>>,
    inflight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl<V: Clone + Send + Sync + 'static> CacheLayer<V> {
    pub fn new(name: &'static str, store: Arc<dyn CacheStore<V>>) -> Self {
        Self {
            name,
            store: Some(store),
            inflight: Arc::new(DashMap::new()),
        }
    }

    pub fn with_ttl(name: &'static str, ttl: Duration) -> Self {
        Self::new(name, Arc::new(TtlStore::<V>::new(ttl)))
    }

    /// A layer that bypasses caching entirely.
    pub fn disabled(name: &'static str) -> Self {
        Self {
            name,
            store: None,
            inflight: Arc::new(DashMap::new()),
        }
    }

    pub fn null(name: &'static str) -> Self {
        Self::new(name, Arc::new(NullStore))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(cache = self.name, key, error = %e, "cache read failed, rebuilding");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: V) {
        if let Some(store) = &self.store {
            if let Err(e) = store.set(key, value) {
                warn!(cache = self.name, key, error = %e, "cache write failed");
            }
        }
    }

    pub fn touch(&self, key: &str) -> bool {
        match &self.store {
            Some(store) => store.touch(key).unwrap_or_else(|e| {
                warn!(cache = self.name, key, error = %e, "cache touch failed");
                false
            }),
            None => false,
        }
    }

    /// Returns the cached value for `key`, or builds and stores it.
    pub fn get_or_try_build<F>(&self, key: &str, build: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        self.get_or_try_build_with(key, |_| true, build)
    }

    /// Like [`get_or_try_build`](Self::get_or_try_build), but a hit rejected by
    /// `accept` counts as a miss and is overwritten by the rebuilt value.
    pub fn get_or_try_build_with<A, F>(&self, key: &str, accept: A, build: F) -> Result<V>
    where
        A: Fn(&V) -> bool,
        F: FnOnce() -> Result<V>,
    {
        if self.store.is_none() {
            return build();
        }
        if let Some(hit) = self.get(key).filter(|v| accept(v)) {
            trace!(cache = self.name, key, "hit");
            return Ok(hit);
        }

        let lock = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock();
            // another caller may have finished the build while we waited
            match self.get(key).filter(|v| accept(v)) {
                Some(hit) => Ok(hit),
                None => {
                    trace!(cache = self.name, key, "miss, building");
                    build().map(|value| {
                        self.set(key, value.clone());
                        value
                    })
                }
            }
        };
        self.inflight
            .remove_if(key, |_, l| Arc::ptr_eq(l, &lock) && Arc::strong_count(l) <= 2);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypegraphError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingStore;

    impl CacheStore<u32> for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<u32>> {
            Err(TypegraphError::Cache("backend down".to_string()))
        }

        fn set(&self, _key: &str, _value: u32) -> Result<()> {
            Err(TypegraphError::Cache("backend down".to_string()))
        }

        fn touch(&self, _key: &str) -> Result<bool> {
            Err(TypegraphError::Cache("backend down".to_string()))
        }
    }

    #[test]
    fn test_builds_once_then_hits() {
        let layer = CacheLayer::<u32>::with_ttl("types", Duration::from_secs(60));
        let builds = AtomicUsize::new(0);
        for _ in 0..3 {
            let v = layer
                .get_or_try_build("k", || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_layer_always_rebuilds() {
        let layer = CacheLayer::<u32>::disabled("types");
        let builds = AtomicUsize::new(0);
        for _ in 0..2 {
            layer
                .get_or_try_build("k", || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(!layer.is_enabled());
    }

    #[test]
    fn test_store_failures_degrade_to_miss() {
        let layer = CacheLayer::<u32>::new("schemas", Arc::new(FailingStore));
        assert_eq!(layer.get("k"), None);
        assert!(!layer.touch("k"));
        assert_eq!(layer.get_or_try_build("k", || Ok(3)).unwrap(), 3);
    }

    #[test]
    fn test_rejected_hit_is_rebuilt_and_replaced() {
        let layer = CacheLayer::<u32>::with_ttl("types", Duration::from_secs(60));
        layer.set("k", 1);
        let v = layer.get_or_try_build_with("k", |v| *v != 1, || Ok(2)).unwrap();
        assert_eq!(v, 2);
        assert_eq!(layer.get("k"), Some(2));
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let layer = CacheLayer::<u32>::with_ttl("types", Duration::from_secs(60));
        let err = layer
            .get_or_try_build("k", || Err(TypegraphError::Parse("bad".to_string())))
            .unwrap_err();
        assert!(matches!(err, TypegraphError::Parse(_)));
        assert_eq!(layer.get("k"), None);
    }

    #[test]
    fn test_concurrent_first_builds_collapse() {
        let layer = CacheLayer::<u32>::with_ttl("schemas", Duration::from_secs(60));
        let builds = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|s| {
            for _ in 0..8 {
                let layer = layer.clone();
                let builds = builds.clone();
                s.spawn(move || {
                    layer
                        .get_or_try_build("k", || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            Ok(42)
                        })
                        .unwrap()
                });
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(layer.get("k"), Some(42));
    }
}
