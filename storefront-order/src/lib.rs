pub mod fetch;
pub mod pricing;
pub mod readiness;
pub mod reconciler;
pub mod summary;

pub use fetch::{decide_fetch, FetchDecision};
pub use pricing::{compute_items_subtotal, Money, PricingCalculator, PricingConfig, RoundingPolicy};
pub use readiness::{PaymentReadiness, ReadinessError};
pub use reconciler::{IneligibleReason, PaymentError, PaymentReconciler};
pub use summary::{DeliveryStatusLine, OrderSummary, PaymentPanel, PaymentStatusLine, SummaryLine};
