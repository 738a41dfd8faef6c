use async_trait::async_trait;
use storefront_shared::{OrderId, OrderSnapshot, PaidConfirmation};

/// Failures reported by the order backing store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Conflicting update: {0}")]
    Conflict(String),
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn fetch_order(&self, id: &OrderId) -> Result<OrderSnapshot, StoreError>;

    /// Persist a reconciled payment (`isPaid = true`, `paidAt = confirmation.at`).
    async fn mark_order_paid(
        &self,
        id: &OrderId,
        confirmation: &PaidConfirmation,
    ) -> Result<(), StoreError>;
}
