//! Dashboard configuration.

use serde::{Deserialize, Serialize};

/// Dashboard server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Enable the HTTP server. The price board runs regardless.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Logical price group published to and served by `/api/price`.
    #[serde(default = "default_group_id")]
    pub group_id: String,
    /// Messages buffered per slow WebSocket subscriber.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_enabled() -> bool {
    false
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> usize {
    10
}

fn default_group_id() -> String {
    "default".to_string()
}

fn default_broadcast_capacity() -> usize {
    32
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            max_connections: default_max_connections(),
            group_id: default_group_id(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.group_id.trim().is_empty() {
            return Err("group_id must not be empty".to_string());
        }
        if self.broadcast_capacity == 0 {
            return Err("broadcast_capacity must be > 0".to_string());
        }
        if self.enabled && self.port == 0 {
            return Err("port must be set when the dashboard is enabled".to_string());
        }
        Ok(())
    }
}
