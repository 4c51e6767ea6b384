//! In-process store backed by `DashMap`.

use crate::error::StoreResult;
use crate::namespace::Namespace;
use crate::state_store::StateStore;
use dashmap::DashMap;
use serde_json::Value;
use surge_core::BoxFuture;

/// Process-lifetime store.
///
/// Shard locking in `DashMap` makes each key operation atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<(Namespace, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in a namespace.
    pub fn len(&self, ns: Namespace) -> usize {
        self.entries.iter().filter(|e| e.key().0 == ns).count()
    }
}

impl StateStore for MemoryStore {
    fn get<'a>(&'a self, ns: Namespace, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>> {
        Box::pin(async move {
            Ok(self
                .entries
                .get(&(ns, key.to_string()))
                .map(|v| v.value().clone()))
        })
    }

    fn set<'a>(&'a self, ns: Namespace, key: &'a str, value: Value) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.entries.insert((ns, key.to_string()), value);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, ns: Namespace, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>> {
        Box::pin(async move { Ok(self.entries.remove(&(ns, key.to_string())).map(|(_, v)| v)) })
    }

    fn get_all(&self, ns: Namespace) -> BoxFuture<'_, StoreResult<Vec<(String, Value)>>> {
        Box::pin(async move {
            Ok(self
                .entries
                .iter()
                .filter(|e| e.key().0 == ns)
                .map(|e| (e.key().1.clone(), e.value().clone()))
                .collect())
        })
    }

    fn clear(&self, ns: Namespace) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.entries.retain(|k, _| k.0 != ns);
            Ok(())
        })
    }
}
