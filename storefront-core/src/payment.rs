use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_shared::Masked;

/// Outcome the payment widget reports for a checkout attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

/// Result handed back by the payment widget once the customer finishes.
/// Transient: it is reconciled and then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    #[serde(rename = "id")]
    pub provider_ref: String,
    pub status: PaymentStatus,
    #[serde(rename = "amount")]
    pub reported_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<Masked<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl PaymentResult {
    pub fn completed(provider_ref: impl Into<String>, reported_amount: Decimal) -> Self {
        Self {
            provider_ref: provider_ref.into(),
            status: PaymentStatus::Completed,
            reported_amount,
            payer_email: None,
            update_time: None,
        }
    }
}

/// Settings the payment SDK needs to render its widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub sdk_url: String,
    pub currency: String,
}

impl ClientConfig {
    /// Script location the loader injects, e.g. `https://www.paypal.com/sdk/js?client-id=abc`.
    pub fn script_url(&self) -> String {
        format!(
            "{}?client-id={}&currency={}",
            self.sdk_url, self.client_id, self.currency
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdkError {
    #[error("Payment SDK failed to load: {0}")]
    LoadFailed(String),

    #[error("Payment SDK client id is missing")]
    MissingClientId,
}

/// Loads the external payment widget. Once loaded the widget reports
/// `PaymentResult`s on its own; this trait only covers availability.
#[async_trait]
pub trait PaymentSdkLoader: Send + Sync {
    async fn load_widget(&self, config: &ClientConfig) -> Result<(), SdkError>;
}
