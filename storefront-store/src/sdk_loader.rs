use async_trait::async_trait;
use std::time::Duration;
use storefront_core::payment::{ClientConfig, PaymentSdkLoader, SdkError};
use tracing::{debug, info};

/// Payment SDK loader with a predetermined outcome.
///
/// Used where no browser exists to inject the script into: the demo binary
/// and tests. The load delay models the script download.
#[derive(Debug, Clone)]
pub struct StaticSdkLoader {
    outcome: Result<(), SdkError>,
    delay: Duration,
}

impl StaticSdkLoader {
    pub fn ready() -> Self {
        Self {
            outcome: Ok(()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(SdkError::LoadFailed(reason.into())),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PaymentSdkLoader for StaticSdkLoader {
    async fn load_widget(&self, config: &ClientConfig) -> Result<(), SdkError> {
        if config.client_id.trim().is_empty() {
            return Err(SdkError::MissingClientId);
        }
        debug!(script = %config.script_url(), "Loading payment SDK");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.outcome.is_ok() {
            info!("Payment SDK loaded");
        }
        self.outcome.clone()
    }
}
