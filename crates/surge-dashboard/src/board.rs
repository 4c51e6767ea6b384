//! Latest-value publication board.

use crate::types::DashboardMessage;
use parking_lot::RwLock;
use std::collections::HashMap;
use surge_core::BoxFuture;
use surge_pricing::{PricePublisher, PriceRecord, PublishError, PublishResult};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// One current record per price group, overwritten on each publish, plus
/// a broadcast feed for live subscribers.
pub struct PriceBoard {
    latest: RwLock<HashMap<String, PriceRecord>>,
    tx: broadcast::Sender<String>,
}

impl PriceBoard {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: RwLock::new(HashMap::new()),
            tx,
        }
    }

    /// Latest record for a group.
    pub fn latest(&self, group_id: &str) -> Option<PriceRecord> {
        self.latest.read().get(group_id).cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn store(&self, record: &PriceRecord) -> PublishResult<()> {
        self.latest
            .write()
            .insert(record.group_id.clone(), record.clone());

        let json = serde_json::to_string(&DashboardMessage::Price(record.clone()))
            .map_err(|e| PublishError::Backend(e.to_string()))?;
        match self.tx.send(json) {
            Ok(n) => trace!(receivers = n, "Price broadcast sent"),
            // No subscribers is normal.
            Err(_) => trace!("No WebSocket receivers connected"),
        }
        debug!(group_id = %record.group_id, price = %record.price, "Price published");
        Ok(())
    }
}

impl PricePublisher for PriceBoard {
    fn publish<'a>(&'a self, record: &'a PriceRecord) -> BoxFuture<'a, PublishResult<()>> {
        Box::pin(async move { self.store(record) })
    }
}
