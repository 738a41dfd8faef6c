use storefront_shared::{OrderId, OrderSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    Fetch,
    Skip,
}

/// Decide whether the order must be (re)read from the backing store.
///
/// Skips only when the snapshot on hand is the requested order and no
/// payment was confirmed since it was read.
pub fn decide_fetch(
    current: Option<&OrderSnapshot>,
    order_id: &OrderId,
    just_paid: bool,
) -> FetchDecision {
    match current {
        Some(order) if order.id == *order_id && !just_paid => FetchDecision::Skip,
        _ => FetchDecision::Fetch,
    }
}
