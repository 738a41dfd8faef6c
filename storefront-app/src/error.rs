use storefront_core::payment::SdkError;
use storefront_core::repository::StoreError;
use storefront_order::readiness::ReadinessError;
use storefront_order::reconciler::PaymentError;
use storefront_shared::SnapshotError;

/// Everything an order screen operation can report back to the view layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("Invalid order snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("No order is open in this session")]
    NoOrder,

    #[error("Session closed")]
    Closed,

    #[error("Order changed while the call was in flight")]
    Superseded,
}

impl SessionError {
    /// Completion arrived for a screen state that no longer exists.
    pub fn is_discarded(&self) -> bool {
        matches!(self, SessionError::Closed | SessionError::Superseded)
    }
}
