//! Decision audit log for surge.
//!
//! Records every committed pricing decision to daily JSON Lines files for
//! post-hoc review of what the engine did and why.

pub mod error;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use writer::{DecisionLog, DecisionRecord};
