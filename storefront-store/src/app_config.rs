use serde::Deserialize;
use std::env;
use std::time::Duration;
use storefront_core::payment::ClientConfig;
use storefront_order::pricing::PricingConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub payment: PaymentConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub demo: Option<DemoConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub client_id: String,
    #[serde(default = "default_sdk_url")]
    pub sdk_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_sdk_url() -> String { "https://www.paypal.com/sdk/js".to_string() }
fn default_currency() -> String { "PHP".to_string() }

impl PaymentConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            client_id: self.client_id.clone(),
            sdk_url: self.sdk_url.clone(),
            currency: self.currency.clone(),
        }
    }
}

/// Upper bounds for calls to external collaborators, in milliseconds.
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    pub fetch_ms: u64,
    pub pay_ms: u64,
    pub sdk_load_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_ms: 5_000,
            pay_ms: 10_000,
            sdk_load_ms: 8_000,
        }
    }
}

impl TimeoutConfig {
    pub fn fetch(&self) -> Duration { Duration::from_millis(self.fetch_ms) }
    pub fn pay(&self) -> Duration { Duration::from_millis(self.pay_ms) }
    pub fn sdk_load(&self) -> Duration { Duration::from_millis(self.sdk_load_ms) }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// JSON file with order snapshots to preload into the in-memory store.
    pub seed_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    pub order_id: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `STOREFRONT__PAYMENT__CLIENT_ID=abc` sets `payment.client_id`
            .add_source(config::Environment::with_prefix("STOREFRONT").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_order::pricing::RoundingPolicy;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [payment]
            client_id = "sandbox-client"
            "#,
        )
        .unwrap();

        assert_eq!(config.payment.sdk_url, "https://www.paypal.com/sdk/js");
        assert_eq!(config.payment.currency, "PHP");
        assert_eq!(config.timeouts.fetch(), Duration::from_secs(5));
        assert_eq!(config.pricing.rounding, RoundingPolicy::HalfUp);
        assert!(config.store.seed_path.is_none());
        assert!(config.demo.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            [payment]
            client_id = "live-client"
            currency = "USD"

            [timeouts]
            fetch_ms = 100
            pay_ms = 200
            sdk_load_ms = 300

            [pricing]
            rounding = "half_even"

            [store]
            seed_path = "config/orders.json"

            [demo]
            order_id = "demo-1"
            "#,
        )
        .unwrap();

        let client = config.payment.client_config();
        assert_eq!(client.client_id, "live-client");
        assert_eq!(client.currency, "USD");
        assert_eq!(config.timeouts.sdk_load(), Duration::from_millis(300));
        assert_eq!(config.pricing.rounding, RoundingPolicy::HalfEven);
        assert_eq!(config.store.seed_path.as_deref(), Some("config/orders.json"));
        assert_eq!(config.demo.unwrap().order_id, "demo-1");
    }

    #[test]
    fn test_missing_client_id_is_an_error() {
        assert!(Config::from_toml_str("[timeouts]\nfetch_ms = 1\npay_ms = 1\nsdk_load_ms = 1\n").is_err());
    }
}
