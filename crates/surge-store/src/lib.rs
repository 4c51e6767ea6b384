//! Signal and pricing state store for surge.
//!
//! Two layers:
//! - `StateStore`: untyped namespaced key-value primitives (`get`, `set`,
//!   `get_all`, `clear`), atomic per key
//! - `SignalStore`: typed facade used by the evaluator, reconciler and
//!   decision engine, including the administrative reset

pub mod error;
pub mod memory;
pub mod namespace;
pub mod signal_store;
pub mod state_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use namespace::Namespace;
pub use signal_store::{
    SignalStore, RESET_COMPETITOR_PRICE, RESET_PRICE, RESET_REASON, RESET_STOCK_LEVEL,
};
pub use state_store::StateStore;
