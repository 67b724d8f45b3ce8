//! Memoization for the three synthesis artifacts.
//!
//! Each concern gets its own [`CacheLayer`] with its own TTL, so a deployment
//! can, for example, keep descriptors for a day while disabling schema reuse.

mod layer;
mod store;

pub use layer::CacheLayer;
pub use store::{CacheStore, DEFAULT_TTL, NullStore, TtlStore};

use crate::config::CacheSettings;
use crate::graph::{ModelTypes, TypeGraph};
use crate::model::ModelDescriptor;
use std::sync::Arc;

#[derive(Clone)]
pub struct Caches {
    pub descriptors: CacheLayer<Arc<ModelDescriptor>>,
    pub types: CacheLayer<Arc<ModelTypes>>,
    pub schemas: CacheLayer<Arc<TypeGraph>>,
}

impl Caches {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        if !settings.enabled {
            return Self::disabled();
        }
        Self {
            descriptors: CacheLayer::with_ttl("descriptors", settings.descriptor_ttl()),
            types: CacheLayer::with_ttl("types", settings.type_ttl()),
            schemas: CacheLayer::with_ttl("schemas", settings.schema_ttl()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            descriptors: CacheLayer::disabled("descriptors"),
            types: CacheLayer::disabled("types"),
            schemas: CacheLayer::disabled("schemas"),
        }
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

/// Stable key for a model set: a hash over each member's cache identity in
/// declaration order.
pub fn schema_key<'a>(models: impl IntoIterator<Item = &'a ModelDescriptor>) -> String {
    let mut hasher = blake3::Hasher::new();
    for model in models {
        hasher.update(model.cache_identity().as_bytes());
        hasher.update(&[0]);
    }
    format!("schema:{}", hasher.finalize().to_hex())
}
