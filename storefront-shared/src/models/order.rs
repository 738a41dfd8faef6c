use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pii::Masked;

/// Opaque order identifier assigned by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How the customer chose to pay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    PayPal,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
        }
    }
}

/// One product entry within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "product")]
    pub product_ref: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "qty")]
    pub quantity: u32,
    #[serde(rename = "image", default)]
    pub image_ref: String,
}

impl LineItem {
    pub fn new(
        product_ref: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_ref: product_ref.into(),
            name: name.into(),
            unit_price,
            quantity,
            image_ref: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(rename = "address")]
    pub address_line: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: Masked<String>,
}

/// An order as read from the backing store.
///
/// Never mutated locally: a payment is persisted through the repository and
/// a fresh snapshot replaces this one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(rename = "orderItems")]
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    pub user: Customer,
}

impl OrderSnapshot {
    /// Unpaid, undelivered order with the given pricing.
    pub fn new(
        id: OrderId,
        user: Customer,
        line_items: Vec<LineItem>,
        payment_method: PaymentMethod,
        shipping_price: Decimal,
        total_price: Decimal,
    ) -> Self {
        Self {
            id,
            line_items,
            shipping_address: ShippingAddress::default(),
            payment_method,
            shipping_price,
            total_price,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            user,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Check the invariants the backing store is expected to uphold.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.is_paid != self.paid_at.is_some() {
            return Err(SnapshotError::PaidFlagMismatch {
                is_paid: self.is_paid,
            });
        }
        if self.is_delivered != self.delivered_at.is_some() {
            return Err(SnapshotError::DeliveredFlagMismatch {
                is_delivered: self.is_delivered,
            });
        }
        if self.shipping_price.is_sign_negative() || self.total_price.is_sign_negative() {
            return Err(SnapshotError::NegativeAmount);
        }
        if self.total_price < self.shipping_price {
            return Err(SnapshotError::TotalBelowShipping {
                total: self.total_price,
                shipping: self.shipping_price,
            });
        }
        for (index, item) in self.line_items.iter().enumerate() {
            if item.unit_price.is_sign_negative() {
                return Err(SnapshotError::InvalidLineItem {
                    index,
                    reason: format!("negative unit price {}", item.unit_price),
                });
            }
            if item.quantity == 0 {
                return Err(SnapshotError::InvalidLineItem {
                    index,
                    reason: "quantity must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("isPaid={is_paid} disagrees with paidAt")]
    PaidFlagMismatch { is_paid: bool },

    #[error("isDelivered={is_delivered} disagrees with deliveredAt")]
    DeliveredFlagMismatch { is_delivered: bool },

    #[error("Order amounts must not be negative")]
    NegativeAmount,

    #[error("Total {total} is below shipping {shipping}")]
    TotalBelowShipping { total: Decimal, shipping: Decimal },

    #[error("Line item {index} is invalid: {reason}")]
    InvalidLineItem { index: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> OrderSnapshot {
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
            PaymentMethod::PayPal,
            dec!(20),
            dec!(270),
        )
    }

    #[test]
    fn test_valid_snapshot() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_paid_at_requires_is_paid() {
        let mut order = sample();
        order.paid_at = Some(Utc::now());
        assert_eq!(
            order.validate(),
            Err(SnapshotError::PaidFlagMismatch { is_paid: false })
        );

        order.is_paid = true;
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn test_delivered_requires_timestamp() {
        let mut order = sample();
        order.is_delivered = true;
        assert!(matches!(
            order.validate(),
            Err(SnapshotError::DeliveredFlagMismatch { .. })
        ));
    }

    #[test]
    fn test_total_below_shipping_rejected() {
        let mut order = sample();
        order.total_price = dec!(10);
        assert!(matches!(
            order.validate(),
            Err(SnapshotError::TotalBelowShipping { .. })
        ));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut order = sample();
        order.line_items[1].quantity = 0;
        assert!(matches!(
            order.validate(),
            Err(SnapshotError::InvalidLineItem { index: 1, .. })
        ));
    }

    #[test]
    fn test_deserialize_store_payload() {
        let json = r#"{
            "_id": "64f1c0",
            "orderItems": [
                { "product": "p1", "name": "Lamp", "price": 100, "qty": 2, "image": "/images/lamp.png" }
            ],
            "shippingAddress": { "address": "1 Main St", "city": "Manila", "postalCode": "1000", "country": "PH" },
            "paymentMethod": "CashOnDelivery",
            "shippingPrice": 20,
            "totalPrice": 220.5,
            "isPaid": false,
            "isDelivered": true,
            "deliveredAt": "2024-03-01T10:00:00Z",
            "user": { "name": "Bob", "email": "bob@example.com" }
        }"#;

        let order: OrderSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new("64f1c0"));
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.line_items[0].quantity, 2);
        assert_eq!(order.line_items[0].unit_price, dec!(100));
        assert_eq!(order.total_price, dec!(220.5));
        assert_eq!(order.shipping_address.postal_code, "1000");
        assert_eq!(order.user.email.expose(), "bob@example.com");
        assert!(order.paid_at.is_none());
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn test_debug_masks_email() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("alice@example.com"));
    }
}
