use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderId;

/// Emitted once an externally reported payment has been reconciled against
/// the order total. The caller forwards it to the backing store, which sets
/// `isPaid` / `paidAt` from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidConfirmation {
    pub order_id: OrderId,
    pub provider_ref: String,
    pub amount: Decimal,
    pub at: DateTime<Utc>,
}
