use storefront_shared::{OrderSnapshot, PaymentMethod};
use tracing::debug;

/// Gate for showing the payment widget.
///
/// `Uninitialized → Loading → Ready`, with `Failed` as a terminal state for
/// the current order context. Only `reset` goes back to `Uninitialized`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentReadiness {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl PaymentReadiness {
    /// SDK script requested: Uninitialized → Loading
    pub fn request_sdk(&mut self) -> Result<(), ReadinessError> {
        self.transition(matches!(self, PaymentReadiness::Uninitialized), PaymentReadiness::Loading)
    }

    /// SDK script loaded: Loading → Ready
    pub fn sdk_loaded(&mut self) -> Result<(), ReadinessError> {
        self.transition(matches!(self, PaymentReadiness::Loading), PaymentReadiness::Ready)
    }

    /// SDK script failed: Loading → Failed
    pub fn sdk_failed(&mut self, reason: impl Into<String>) -> Result<(), ReadinessError> {
        self.transition(
            matches!(self, PaymentReadiness::Loading),
            PaymentReadiness::Failed(reason.into()),
        )
    }

    /// SDK already present in the environment: Uninitialized → Ready
    pub fn mark_preloaded(&mut self) -> Result<(), ReadinessError> {
        self.transition(matches!(self, PaymentReadiness::Uninitialized), PaymentReadiness::Ready)
    }

    /// New order context.
    pub fn reset(&mut self) {
        *self = PaymentReadiness::Uninitialized;
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PaymentReadiness::Ready)
    }

    /// The widget renders only for an unpaid PayPal order once the SDK is ready.
    pub fn widget_visible(&self, order: &OrderSnapshot) -> bool {
        self.is_ready() && order.payment_method == PaymentMethod::PayPal && !order.is_paid
    }

    /// An SDK load should be started for this order.
    pub fn needs_sdk(&self, order: &OrderSnapshot) -> bool {
        matches!(self, PaymentReadiness::Uninitialized)
            && order.payment_method == PaymentMethod::PayPal
            && !order.is_paid
    }

    fn name(&self) -> &'static str {
        match self {
            PaymentReadiness::Uninitialized => "UNINITIALIZED",
            PaymentReadiness::Loading => "LOADING",
            PaymentReadiness::Ready => "READY",
            PaymentReadiness::Failed(_) => "FAILED",
        }
    }

    fn transition(&mut self, allowed: bool, next: PaymentReadiness) -> Result<(), ReadinessError> {
        if !allowed {
            return Err(ReadinessError::InvalidTransition {
                from: self.name().to_string(),
                to: next.name().to_string(),
            });
        }
        debug!(from = self.name(), to = next.name(), "Payment readiness transition");
        *self = next;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadinessError {
    #[error("Invalid readiness transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storefront_shared::{Customer, Masked, OrderId};

    fn order(method: PaymentMethod, is_paid: bool) -> OrderSnapshot {
        let mut order = OrderSnapshot::new(
            OrderId::new("X"),
            Customer {
                name: "Alice".to_string(),
                email: Masked::from("alice@example.com"),
            },
            vec![],
            method,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        if is_paid {
            order.is_paid = true;
            order.paid_at = Some(chrono::Utc::now());
        }
        order
    }

    #[test]
    fn test_load_lifecycle() {
        let mut readiness = PaymentReadiness::default();
        assert_eq!(readiness, PaymentReadiness::Uninitialized);

        readiness.request_sdk().unwrap();
        assert_eq!(readiness, PaymentReadiness::Loading);

        readiness.sdk_loaded().unwrap();
        assert_eq!(readiness, PaymentReadiness::Ready);
    }

    #[test]
    fn test_widget_visibility() {
        let mut readiness = PaymentReadiness::default();
        let unpaid_paypal = order(PaymentMethod::PayPal, false);
        assert!(!readiness.widget_visible(&unpaid_paypal));

        readiness.request_sdk().unwrap();
        assert!(!readiness.widget_visible(&unpaid_paypal));

        readiness.sdk_loaded().unwrap();
        assert!(readiness.widget_visible(&unpaid_paypal));
        assert!(!readiness.widget_visible(&order(PaymentMethod::PayPal, true)));
        assert!(!readiness.widget_visible(&order(PaymentMethod::CashOnDelivery, false)));
    }

    #[test]
    fn test_failure_is_terminal_until_reset() {
        let mut readiness = PaymentReadiness::default();
        readiness.request_sdk().unwrap();
        readiness.sdk_failed("script error").unwrap();
        assert_eq!(readiness, PaymentReadiness::Failed("script error".to_string()));
        assert!(!readiness.widget_visible(&order(PaymentMethod::PayPal, false)));

        assert!(readiness.request_sdk().is_err());
        assert!(readiness.sdk_loaded().is_err());
        assert!(matches!(readiness, PaymentReadiness::Failed(_)));

        readiness.reset();
        assert_eq!(readiness, PaymentReadiness::Uninitialized);
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut readiness = PaymentReadiness::default();
        let err = readiness.sdk_loaded().unwrap_err();
        assert_eq!(
            err,
            ReadinessError::InvalidTransition {
                from: "UNINITIALIZED".to_string(),
                to: "READY".to_string(),
            }
        );
        assert_eq!(readiness, PaymentReadiness::Uninitialized);

        readiness.request_sdk().unwrap();
        assert!(readiness.request_sdk().is_err());
        assert!(readiness.mark_preloaded().is_err());
        assert_eq!(readiness, PaymentReadiness::Loading);
    }

    #[test]
    fn test_preloaded_sdk_skips_loading() {
        let mut readiness = PaymentReadiness::default();
        readiness.mark_preloaded().unwrap();
        assert!(readiness.is_ready());
    }

    #[test]
    fn test_needs_sdk() {
        let readiness = PaymentReadiness::default();
        assert!(readiness.needs_sdk(&order(PaymentMethod::PayPal, false)));
        assert!(!readiness.needs_sdk(&order(PaymentMethod::PayPal, true)));
        assert!(!readiness.needs_sdk(&order(PaymentMethod::CashOnDelivery, false)));
        assert!(!PaymentReadiness::Ready.needs_sdk(&order(PaymentMethod::PayPal, false)));
    }
}
