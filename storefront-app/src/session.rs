use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use storefront_core::clock::Clock;
use storefront_core::payment::{ClientConfig, PaymentResult, PaymentSdkLoader};
use storefront_core::repository::{OrderRepository, StoreError};
use storefront_order::fetch::{decide_fetch, FetchDecision};
use storefront_order::pricing::{PricingCalculator, PricingConfig};
use storefront_order::readiness::PaymentReadiness;
use storefront_order::reconciler::PaymentReconciler;
use storefront_order::summary::OrderSummary;
use storefront_shared::{OrderId, OrderSnapshot, PaidConfirmation, PaymentMethod};
use storefront_store::app_config::TimeoutConfig;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::error::SessionError;

/// Collaborators and settings a session is built from.
pub struct SessionDeps {
    pub repository: Arc<dyn OrderRepository>,
    pub sdk_loader: Arc<dyn PaymentSdkLoader>,
    pub clock: Arc<dyn Clock>,
    pub client_config: ClientConfig,
    pub timeouts: TimeoutConfig,
    pub pricing: PricingConfig,
}

/// Read-only picture of the screen for the rendering layer.
#[derive(Debug, Clone)]
pub struct ScreenView {
    pub order_id: Option<OrderId>,
    pub loading: bool,
    pub paying: bool,
    pub readiness: PaymentReadiness,
    pub summary: Option<OrderSummary>,
    pub error: Option<String>,
}

#[derive(Debug)]
struct ScreenState {
    alive: bool,
    epoch: u64,
    order_id: Option<OrderId>,
    current: Option<OrderSnapshot>,
    just_paid: bool,
    // The store may hold a newer version than `current`
    stale: bool,
    readiness: PaymentReadiness,
    loading: bool,
    paying: bool,
    last_error: Option<SessionError>,
}

impl ScreenState {
    fn new() -> Self {
        Self {
            alive: true,
            epoch: 0,
            order_id: None,
            current: None,
            just_paid: false,
            stale: false,
            readiness: PaymentReadiness::default(),
            loading: false,
            paying: false,
            last_error: None,
        }
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.alive {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    /// A completion for `epoch` may still be applied.
    fn guard(&self, epoch: u64) -> Result<(), SessionError> {
        self.ensure_alive()?;
        if self.epoch != epoch {
            return Err(SessionError::Superseded);
        }
        Ok(())
    }

    /// The snapshot on hand, if it belongs to the open order.
    fn current_order(&self) -> Option<&OrderSnapshot> {
        let order_id = self.order_id.as_ref()?;
        self.current.as_ref().filter(|order| order.id == *order_id)
    }
}

struct SessionInner {
    repository: Arc<dyn OrderRepository>,
    sdk_loader: Arc<dyn PaymentSdkLoader>,
    client_config: ClientConfig,
    timeouts: TimeoutConfig,
    pricing: PricingCalculator,
    reconciler: PaymentReconciler,
    state: RwLock<ScreenState>,
}

#[derive(Clone)]
pub struct OrderScreenSession {
    inner: Arc<SessionInner>,
}

impl OrderScreenSession {
    pub fn new(deps: SessionDeps) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                repository: deps.repository,
                sdk_loader: deps.sdk_loader,
                client_config: deps.client_config,
                timeouts: deps.timeouts,
                pricing: PricingCalculator::new(deps.pricing),
                reconciler: PaymentReconciler::new(deps.clock),
                state: RwLock::new(ScreenState::new()),
            }),
        }
    }

    /// Show `order_id`. A different id than the one on screen starts a new
    /// order context: readiness is reset and in-flight calls for the old
    /// order are discarded when they complete.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn open(&self, order_id: OrderId) -> Result<(), SessionError> {
        {
            let mut state = self.inner.state.write().await;
            state.ensure_alive()?;
            if state.order_id.as_ref() != Some(&order_id) {
                state.epoch += 1;
                state.order_id = Some(order_id);
                state.readiness.reset();
                state.just_paid = false;
                state.stale = false;
                state.paying = false;
                state.last_error = None;
                info!(epoch = state.epoch, "New order context");
            }
        }
        self.refresh().await
    }

    /// Fetch the order if needed, then make sure the payment panel can render.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let (order_id, epoch, decision) = {
            let mut state = self.inner.state.write().await;
            state.ensure_alive()?;
            let order_id = state.order_id.clone().ok_or(SessionError::NoOrder)?;
            let decision =
                decide_fetch(state.current.as_ref(), &order_id, state.just_paid || state.stale);
            if decision == FetchDecision::Fetch {
                state.loading = true;
            }
            (order_id, state.epoch, decision)
        };

        if decision == FetchDecision::Skip {
            debug!(order_id = %order_id, "Order already current");
            return self.prepare_payment().await;
        }

        let fetched = within(
            "fetch_order",
            self.inner.timeouts.fetch(),
            self.inner.repository.fetch_order(&order_id),
        )
        .await
        .and_then(|snapshot| {
            snapshot.validate()?;
            Ok(snapshot)
        });

        {
            let mut state = self.inner.state.write().await;
            if let Err(discarded) = state.guard(epoch) {
                debug!(order_id = %order_id, reason = %discarded, "Dropping fetch result");
                return Err(discarded);
            }
            state.loading = false;
            match fetched {
                Ok(snapshot) => {
                    info!(order_id = %order_id, is_paid = snapshot.is_paid, "Order loaded");
                    state.current = Some(snapshot);
                    state.just_paid = false;
                    state.stale = false;
                    state.last_error = None;
                }
                Err(err) => {
                    error!(order_id = %order_id, error = %err, "Order fetch failed");
                    state.last_error = Some(err.clone());
                    return Err(err);
                }
            }
        }

        self.prepare_payment().await
    }

    /// Load the payment SDK for an unpaid PayPal order.
    ///
    /// Cash on delivery needs no SDK and is marked ready directly. A failed or
    /// timed-out load leaves readiness `Failed`: the screen falls back to the
    /// neutral message and this call still succeeds.
    #[instrument(skip(self))]
    pub async fn prepare_payment(&self) -> Result<(), SessionError> {
        let epoch = {
            let mut state = self.inner.state.write().await;
            state.ensure_alive()?;
            let (needs_sdk, cash_on_delivery) = match state.current_order() {
                Some(order) => (
                    state.readiness.needs_sdk(order),
                    order.payment_method == PaymentMethod::CashOnDelivery && !order.is_paid,
                ),
                None => return Ok(()),
            };

            if cash_on_delivery && state.readiness == PaymentReadiness::Uninitialized {
                state.readiness.mark_preloaded()?;
                return Ok(());
            }
            if !needs_sdk {
                return Ok(());
            }
            state.readiness.request_sdk()?;
            state.epoch
        };

        let loaded = within(
            "load_widget",
            self.inner.timeouts.sdk_load(),
            self.inner.sdk_loader.load_widget(&self.inner.client_config),
        )
        .await;

        let mut state = self.inner.state.write().await;
        state.guard(epoch)?;
        match loaded {
            Ok(()) => state.readiness.sdk_loaded()?,
            Err(err) => {
                warn!(error = %err, "Payment SDK unavailable");
                state.readiness.sdk_failed(err.to_string())?;
                state.last_error = Some(err);
            }
        }
        Ok(())
    }

    /// Handle the payment widget's completion callback.
    ///
    /// The confirmation is persisted before the order is re-fetched, so the
    /// screen only ever shows "paid" from the backing store's own snapshot.
    /// Once persisted, the confirmation is returned even if the screen was
    /// closed or moved to another order meanwhile.
    #[instrument(skip_all, fields(provider_ref = %result.provider_ref))]
    pub async fn on_payment_result(
        &self,
        result: PaymentResult,
    ) -> Result<PaidConfirmation, SessionError> {
        let (confirmation, epoch) = {
            let mut state = self.inner.state.write().await;
            state.ensure_alive()?;
            let order = state.current_order().ok_or(SessionError::NoOrder)?;
            match self.inner.reconciler.reconcile(order, &result) {
                Ok(confirmation) => {
                    state.paying = true;
                    (confirmation, state.epoch)
                }
                Err(err) => {
                    let err = SessionError::from(err);
                    state.last_error = Some(err.clone());
                    return Err(err);
                }
            }
        };

        let persisted = within(
            "mark_order_paid",
            self.inner.timeouts.pay(),
            self.inner
                .repository
                .mark_order_paid(&confirmation.order_id, &confirmation),
        )
        .await;

        {
            let mut state = self.inner.state.write().await;
            if let Err(discarded) = state.guard(epoch) {
                return match persisted {
                    Ok(()) => {
                        info!(order_id = %confirmation.order_id, reason = %discarded, "Payment persisted for a screen no longer shown");
                        Ok(confirmation)
                    }
                    Err(_) => Err(discarded),
                };
            }
            state.paying = false;
            if let Err(err) = persisted {
                error!(order_id = %confirmation.order_id, error = %err, "Persisting payment failed");
                // A conflict or a lost reply means the store may already differ
                if matches!(
                    err,
                    SessionError::Store(StoreError::Conflict(_)) | SessionError::Timeout { .. }
                ) {
                    state.stale = true;
                }
                state.last_error = Some(err.clone());
                return Err(err);
            }
            state.just_paid = true;
        }

        self.refresh().await?;
        Ok(confirmation)
    }

    /// Leave the screen. Pending completions become no-ops.
    pub async fn close(&self) {
        let mut state = self.inner.state.write().await;
        if state.alive {
            state.alive = false;
            info!(order_id = ?state.order_id, "Order screen closed");
        }
    }

    pub async fn view(&self) -> ScreenView {
        let state = self.inner.state.read().await;
        ScreenView {
            order_id: state.order_id.clone(),
            loading: state.loading,
            paying: state.paying,
            readiness: state.readiness.clone(),
            summary: state
                .current_order()
                .map(|order| OrderSummary::from_snapshot(order, &state.readiness, &self.inner.pricing)),
            error: state.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub async fn summary(&self) -> Option<OrderSummary> {
        let state = self.inner.state.read().await;
        state
            .current_order()
            .map(|order| OrderSummary::from_snapshot(order, &state.readiness, &self.inner.pricing))
    }

    pub async fn current_order(&self) -> Option<OrderSnapshot> {
        self.inner.state.read().await.current_order().cloned()
    }
}

/// Bound an external call by `limit`.
async fn within<T, E, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, E>>,
    SessionError: From<E>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(SessionError::from),
        Err(_) => {
            warn!(operation, limit_ms = limit.as_millis() as u64, "External call timed out");
            Err(SessionError::Timeout { operation })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::clock::SystemClock;
    use storefront_store::{InMemoryOrderRepository, StaticSdkLoader};

    fn session(repository: InMemoryOrderRepository) -> OrderScreenSession {
        OrderScreenSession::new(SessionDeps {
            repository: Arc::new(repository),
            sdk_loader: Arc::new(StaticSdkLoader::ready()),
            clock: Arc::new(SystemClock),
            client_config: ClientConfig {
                client_id: "sandbox".to_string(),
                sdk_url: "https://www.paypal.com/sdk/js".to_string(),
                currency: "PHP".to_string(),
            },
            timeouts: TimeoutConfig::default(),
            pricing: PricingConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_refresh_without_order() {
        let session = session(InMemoryOrderRepository::new());
        assert_eq!(session.refresh().await, Err(SessionError::NoOrder));
        assert!(session.view().await.summary.is_none());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let session = session(InMemoryOrderRepository::new());
        session.close().await;
        assert_eq!(session.open(OrderId::new("X")).await, Err(SessionError::Closed));
        assert_eq!(
            session
                .on_payment_result(PaymentResult::completed("PAY-1", Default::default()))
                .await,
            Err(SessionError::Closed)
        );
    }

    #[tokio::test]
    async fn test_within_maps_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<(), SessionError>(())
        };
        assert_eq!(
            within("slow_call", Duration::from_millis(5), slow).await,
            Err(SessionError::Timeout { operation: "slow_call" })
        );
    }
}
