use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use storefront_shared::{OrderId, OrderSnapshot, PaymentMethod};

use crate::pricing::{Money, PricingCalculator};
use crate::readiness::PaymentReadiness;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatusLine {
    Paid { at: DateTime<Utc> },
    NotPaid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatusLine {
    Delivered { at: DateTime<Utc> },
    NotDelivered,
}

/// What the payment column shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPanel {
    /// SDK not ready (loading, failed or never needed): neutral message.
    ThankYou,
    /// `amount` is the authoritative order total, unrounded.
    PayPalButton { amount: Decimal },
    PaidViaPayPal,
    /// Cash on delivery: remind the customer to keep exact change.
    CashOnDelivery,
}

impl PaymentPanel {
    pub fn message(&self) -> &'static str {
        match self {
            PaymentPanel::ThankYou => "Thank you for your purchase!",
            PaymentPanel::PayPalButton { .. } | PaymentPanel::PaidViaPayPal => "Method: PayPal",
            PaymentPanel::CashOnDelivery => "Please keep exact change ready for the delivery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub name: String,
    pub product_ref: String,
    pub image_ref: String,
    pub quantity: u32,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub customer_name: String,
    pub customer_mailto: String,
    pub shipping_city: String,
    pub deliver_to: String,
    pub payment_method: &'static str,
    pub payment_status: PaymentStatusLine,
    pub delivery_status: DeliveryStatusLine,
    pub lines: Vec<SummaryLine>,
    pub is_empty: bool,
    pub item_count: usize,
    pub items_subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub payment_panel: PaymentPanel,
}

impl OrderSummary {
    pub fn from_snapshot(
        order: &OrderSnapshot,
        readiness: &PaymentReadiness,
        pricing: &PricingCalculator,
    ) -> Self {
        let lines = order
            .line_items
            .iter()
            .map(|item| SummaryLine {
                name: item.name.clone(),
                product_ref: item.product_ref.clone(),
                image_ref: item.image_ref.clone(),
                quantity: item.quantity,
                subtotal: pricing.line_subtotal(item),
            })
            .collect();

        let address = &order.shipping_address;

        Self {
            order_id: order.id.clone(),
            customer_name: order.user.name.clone(),
            customer_mailto: format!("mailto:{}", order.user.email.expose()),
            shipping_city: address.city.clone(),
            deliver_to: format!(
                "{}, {}, {}",
                address.address_line, address.city, address.postal_code
            ),
            payment_method: order.payment_method.label(),
            payment_status: match order.paid_at {
                Some(at) if order.is_paid => PaymentStatusLine::Paid { at },
                _ => PaymentStatusLine::NotPaid,
            },
            delivery_status: match order.delivered_at {
                Some(at) if order.is_delivered => DeliveryStatusLine::Delivered { at },
                _ => DeliveryStatusLine::NotDelivered,
            },
            lines,
            is_empty: order.is_empty(),
            item_count: order.line_items.len(),
            items_subtotal: pricing.items_subtotal(&order.line_items),
            shipping: pricing.format_amount(order.shipping_price),
            total: pricing.format_amount(order.total_price),
            payment_panel: payment_panel(order, readiness),
        }
    }
}

fn payment_panel(order: &OrderSnapshot, readiness: &PaymentReadiness) -> PaymentPanel {
    if !readiness.is_ready() {
        return PaymentPanel::ThankYou;
    }
    match order.payment_method {
        PaymentMethod::CashOnDelivery => PaymentPanel::CashOnDelivery,
        PaymentMethod::PayPal if readiness.widget_visible(order) => PaymentPanel::PayPalButton {
            amount: order.total_price,
        },
        PaymentMethod::PayPal => PaymentPanel::PaidViaPayPal,
    }
}
