//! surge-dashboard - publication channel and HTTP surface for surge.
//!
//! [`PriceBoard`] is the publication channel: it keeps the latest record
//! per price group and fans every publish out to WebSocket subscribers.
//! The optional axum server exposes it alongside the inbound operations.
//!
//! # Routes
//!
//! ```text
//! GET  /api/price     latest published record for the configured group
//! GET  /api/state     persisted pricing state
//! POST /api/signals   submit a signal (?immediate=true prices it now)
//! POST /api/views     record a page view
//! POST /api/reset     administrative reset
//! GET  /ws            live price updates
//! GET  /metrics       Prometheus text exposition
//! ```

mod board;
mod config;
mod error;
mod server;
mod types;

pub use board::PriceBoard;
pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use server::{create_router, run_server, AppState, ConnectionLimiter};
pub use types::{
    DashboardMessage, ProcessResponse, SignalAccepted, SignalRequest, ViewRequest,
};
