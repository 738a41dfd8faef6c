use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use storefront_core::clock::Clock;
use storefront_core::payment::{PaymentResult, PaymentStatus};
use storefront_shared::{OrderId, OrderSnapshot, PaidConfirmation, PaymentMethod};
use tracing::{info, warn};

/// Why an order cannot take a widget payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    AlreadyPaid,
    NotPayPal(PaymentMethod),
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::AlreadyPaid => write!(f, "order is already paid"),
            IneligibleReason::NotPayPal(method) => write!(f, "payment method is {}", method.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("Order {order_id} cannot be paid here: {reason}")]
    InvalidState {
        order_id: OrderId,
        reason: IneligibleReason,
    },

    #[error("Reported amount {reported} does not match order total {expected}")]
    AmountMismatch { expected: Decimal, reported: Decimal },

    #[error("Payment {provider_ref} is not completed ({status:?})")]
    PaymentNotCompleted {
        provider_ref: String,
        status: PaymentStatus,
    },
}

/// Checks a widget-reported payment against the authoritative order total.
///
/// Produces the confirmation the caller persists; never persists anything
/// itself.
pub struct PaymentReconciler {
    clock: Arc<dyn Clock>,
}

impl PaymentReconciler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn reconcile(
        &self,
        order: &OrderSnapshot,
        result: &PaymentResult,
    ) -> Result<PaidConfirmation, PaymentError> {
        if order.is_paid {
            return Err(self.reject(order, IneligibleReason::AlreadyPaid));
        }
        if order.payment_method != PaymentMethod::PayPal {
            return Err(self.reject(order, IneligibleReason::NotPayPal(order.payment_method)));
        }

        if result.status != PaymentStatus::Completed {
            warn!(order_id = %order.id, status = ?result.status, "Payment not completed");
            return Err(PaymentError::PaymentNotCompleted {
                provider_ref: result.provider_ref.clone(),
                status: result.status,
            });
        }

        // Decimal equality ignores scale, so 270 == 270.00.
        if result.reported_amount != order.total_price {
            warn!(
                order_id = %order.id,
                expected = %order.total_price,
                reported = %result.reported_amount,
                "Payment amount mismatch"
            );
            return Err(PaymentError::AmountMismatch {
                expected: order.total_price,
                reported: result.reported_amount,
            });
        }

        let confirmation = PaidConfirmation {
            order_id: order.id.clone(),
            provider_ref: result.provider_ref.clone(),
            amount: result.reported_amount,
            at: self.clock.now(),
        };
        info!(order_id = %order.id, provider_ref = %confirmation.provider_ref, "Payment reconciled");
        Ok(confirmation)
    }

    fn reject(&self, order: &OrderSnapshot, reason: IneligibleReason) -> PaymentError {
        warn!(order_id = %order.id, %reason, "Reconciliation on ineligible order");
        PaymentError::InvalidState {
            order_id: order.id.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use storefront_core::clock::FixedClock;
    use storefront_shared::{Customer, LineItem, Masked};

    fn reconciler() -> PaymentReconciler {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        PaymentReconciler::new(Arc::new(FixedClock(at)))
    }

    fn order(method: PaymentMethod) -> OrderSnapshot {
        OrderSnapshot::new(
            OrderId::new("X"),
            Customer {
                name: "Alice".to_string(),
                email: Masked::from("alice@example.com"),
            },
            vec![
                LineItem::new("p1", "Lamp", dec!(100), 2),
                LineItem::new("p2", "Shade", dec!(50), 1),
            ],
            method,
            dec!(20),
            dec!(270),
        )
    }

    #[test]
    fn test_exact_amount_confirms() {
        let confirmation = reconciler()
            .reconcile(&order(PaymentMethod::PayPal), &PaymentResult::completed("PAY-1", dec!(270)))
            .unwrap();

        assert_eq!(confirmation.order_id, OrderId::new("X"));
        assert_eq!(confirmation.provider_ref, "PAY-1");
        assert_eq!(confirmation.amount, dec!(270));
        assert_eq!(confirmation.at, Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_scale_does_not_matter() {
        let result = reconciler()
            .reconcile(&order(PaymentMethod::PayPal), &PaymentResult::completed("PAY-1", dec!(270.00)));
        assert!(result.is_ok());
    }

    #[test]
    fn test_amount_mismatch_rejected() {
        let err = reconciler()
            .reconcile(&order(PaymentMethod::PayPal), &PaymentResult::completed("PAY-1", dec!(269.99)))
            .unwrap_err();

        assert_eq!(
            err,
            PaymentError::AmountMismatch {
                expected: dec!(270),
                reported: dec!(269.99),
            }
        );
    }

    #[test]
    fn test_cash_on_delivery_is_invalid_state() {
        for amount in [dec!(270), dec!(1)] {
            let err = reconciler()
                .reconcile(
                    &order(PaymentMethod::CashOnDelivery),
                    &PaymentResult::completed("PAY-1", amount),
                )
                .unwrap_err();
            assert_eq!(
                err,
                PaymentError::InvalidState {
                    order_id: OrderId::new("X"),
                    reason: IneligibleReason::NotPayPal(PaymentMethod::CashOnDelivery),
                }
            );
        }
    }

    #[test]
    fn test_already_paid_is_invalid_state() {
        let mut paid = order(PaymentMethod::PayPal);
        paid.is_paid = true;
        paid.paid_at = Some(Utc::now());

        for amount in [dec!(270), dec!(0)] {
            let err = reconciler()
                .reconcile(&paid, &PaymentResult::completed("PAY-1", amount))
                .unwrap_err();
            assert!(matches!(
                err,
                PaymentError::InvalidState {
                    reason: IneligibleReason::AlreadyPaid,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_pending_payment_not_confirmed() {
        let mut result = PaymentResult::completed("PAY-2", dec!(270));
        result.status = PaymentStatus::Pending;

        let err = reconciler()
            .reconcile(&order(PaymentMethod::PayPal), &result)
            .unwrap_err();
        assert!(matches!(err, PaymentError::PaymentNotCompleted { .. }));
    }
}
