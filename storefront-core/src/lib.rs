pub mod clock;
pub mod payment;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use payment::{ClientConfig, PaymentResult, PaymentSdkLoader, PaymentStatus, SdkError};
pub use repository::{OrderRepository, StoreError};
