pub mod models;
pub mod pii;

pub use models::events::PaidConfirmation;
pub use models::order::{
    Customer, LineItem, OrderId, OrderSnapshot, PaymentMethod, ShippingAddress, SnapshotError,
};
pub use pii::Masked;
