use std::sync::Arc;

use anyhow::Context;
use storefront_app::{OrderScreenSession, ScreenView, SessionDeps};
use storefront_core::clock::SystemClock;
use storefront_core::payment::PaymentResult;
use storefront_order::summary::PaymentPanel;
use storefront_shared::OrderId;
use storefront_store::{Config, InMemoryOrderRepository, StaticSdkLoader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_app=debug,storefront_order=debug,storefront_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;

    let repository = match &config.store.seed_path {
        Some(path) => InMemoryOrderRepository::from_json_file(path)
            .with_context(|| format!("Failed to seed orders from {}", path))?,
        None => InMemoryOrderRepository::new(),
    };
    let order_id = config
        .demo
        .as_ref()
        .map(|demo| OrderId::new(demo.order_id.clone()))
        .context("No demo order configured ([demo] order_id)")?;

    let session = OrderScreenSession::new(SessionDeps {
        repository: Arc::new(repository),
        sdk_loader: Arc::new(StaticSdkLoader::ready()),
        clock: Arc::new(SystemClock),
        client_config: config.payment.client_config(),
        timeouts: config.timeouts.clone(),
        pricing: config.pricing.clone(),
    });

    tracing::info!(order_id = %order_id, "Opening order screen");
    session.open(order_id).await?;
    let view = session.view().await;
    log_view(&view);

    // Stand in for the widget: pay exactly what the button was rendered with.
    if let Some(PaymentPanel::PayPalButton { amount }) = view.summary.map(|s| s.payment_panel) {
        let provider_ref = format!("DEMO-{}", uuid::Uuid::new_v4().simple());
        match session
            .on_payment_result(PaymentResult::completed(provider_ref, amount))
            .await
        {
            Ok(confirmation) => {
                tracing::info!(provider_ref = %confirmation.provider_ref, at = %confirmation.at, "Payment confirmed")
            }
            Err(e) => tracing::error!(error = %e, "Payment rejected"),
        }
        log_view(&session.view().await);
    }

    session.close().await;
    Ok(())
}

fn log_view(view: &ScreenView) {
    match &view.summary {
        Some(summary) => tracing::info!(
            order_id = %summary.order_id,
            customer = %summary.customer_name,
            items = summary.item_count,
            subtotal = %summary.items_subtotal,
            shipping = %summary.shipping,
            total = %summary.total,
            payment = ?summary.payment_status,
            delivery = ?summary.delivery_status,
            panel = summary.payment_panel.message(),
            "Order screen"
        ),
        None => tracing::warn!(error = ?view.error, "Order screen has nothing to show"),
    }
}
