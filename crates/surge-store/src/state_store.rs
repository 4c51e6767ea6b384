//! Key-value persistence seam.

use crate::error::StoreResult;
use crate::namespace::Namespace;
use serde_json::Value;
use surge_core::BoxFuture;

/// Namespaced key-value store.
///
/// Every operation is atomic for a single key. No multi-key transactions
/// are offered; callers needing a consistent multi-field record store it
/// under one key.
pub trait StateStore: Send + Sync {
    fn get<'a>(&'a self, ns: Namespace, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>>;

    fn set<'a>(&'a self, ns: Namespace, key: &'a str, value: Value) -> BoxFuture<'a, StoreResult<()>>;

    /// Remove a key, returning its previous value.
    fn remove<'a>(&'a self, ns: Namespace, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>>;

    /// All `(key, value)` entries in a namespace, in no particular order.
    fn get_all(&self, ns: Namespace) -> BoxFuture<'_, StoreResult<Vec<(String, Value)>>>;

    fn clear(&self, ns: Namespace) -> BoxFuture<'_, StoreResult<()>>;
}
