use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use storefront_core::repository::{OrderRepository, StoreError};
use storefront_shared::{OrderId, OrderSnapshot, PaidConfirmation};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Order backing store kept in process memory.
///
/// Stands in for the remote order service: it owns the authoritative
/// snapshots and applies `mark_order_paid` the way the service would.
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, OrderSnapshot>>,
    latency: Duration,
    offline: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            latency: Duration::ZERO,
            offline: AtomicBool::new(false),
        }
    }

    pub fn with_orders(orders: impl IntoIterator<Item = OrderSnapshot>) -> Self {
        let mut repo = Self::new();
        repo.orders = RwLock::new(orders.into_iter().map(|o| (o.id.clone(), o)).collect());
        repo
    }

    /// Load a JSON array of snapshots in the store's wire format.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        let orders: Vec<OrderSnapshot> = serde_json::from_str(&raw)?;
        Ok(Self::with_orders(orders))
    }

    /// Delay applied to every call, simulating a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// While offline every call fails with `StoreError::Network`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn simulate_network(&self) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Network("order service unreachable".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    #[instrument(skip(self, id), fields(order_id = %id))]
    async fn fetch_order(&self, id: &OrderId) -> Result<OrderSnapshot, StoreError> {
        self.simulate_network().await?;
        self.orders
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[instrument(skip(self, id, confirmation), fields(order_id = %id))]
    async fn mark_order_paid(
        &self,
        id: &OrderId,
        confirmation: &PaidConfirmation,
    ) -> Result<(), StoreError> {
        self.simulate_network().await?;
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if order.is_paid {
            warn!("Order already paid");
            return Err(StoreError::Conflict(format!("order {} is already paid", id)));
        }
        if confirmation.amount != order.total_price {
            warn!(amount = %confirmation.amount, total = %order.total_price, "Confirmation amount differs from total");
            return Err(StoreError::Conflict(format!(
                "confirmed amount {} differs from total {}",
                confirmation.amount, order.total_price
            )));
        }

        order.is_paid = true;
        order.paid_at = Some(confirmation.at);
        info!(provider_ref = %confirmation.provider_ref, "Order marked paid");
        Ok(())
    }
}
