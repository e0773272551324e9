/// Applying a chosen recommendation to the live cart
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::{contains_product, AggregatedRecommendation, CartLine, Catalog, CatalogProduct, RecommendationContext},
    services::engine::{RecommendationEngine, RecommendationReport},
};

const EVENT_CAPACITY: usize = 64;

/// Cart-mutation collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CartStore: Send + Sync {
    async fn lines(&self, session_id: &str) -> AppResult<Vec<CartLine>>;

    /// Adds `quantity` of `product`, incrementing an existing line
    async fn add_item(&self, session_id: &str, product: &CatalogProduct, quantity: u32) -> AppResult<()>;
}

/// Process-local cart store keyed by session id
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<String, Vec<CartLine>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CartStore for InMemoryCartStore {
    async fn lines(&self, session_id: &str) -> AppResult<Vec<CartLine>> {
        let carts = self.carts.read().await;
        Ok(carts.get(session_id).cloned().unwrap_or_default())
    }

    async fn add_item(&self, session_id: &str, product: &CatalogProduct, quantity: u32) -> AppResult<()> {
        if quantity == 0 {
            return Err(AppError::InvalidInput("quantity must be at least 1".to_string()));
        }

        let mut carts = self.carts.write().await;
        let lines = carts.entry(session_id.to_string()).or_default();
        match lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
            }
            None => lines.push(CartLine::new(product.clone(), quantity)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    Changed {
        session_id: String,
        product_id: String,
        quantity: u32,
    },
}

/// Publish/subscribe channel for cart changes
#[derive(Debug, Clone)]
pub struct CartEvents {
    tx: broadcast::Sender<CartEvent>,
}

impl CartEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: CartEvent) {
        // Err only means nobody is listening
        if self.tx.send(event).is_err() {
            tracing::debug!("Cart event published with no subscribers");
        }
    }
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    Added,
    AlreadyInCart,
    ProductUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub outcome: ApplyOutcome,
    /// Fresh pass over the updated cart, present only after an add
    pub recommendations: Option<RecommendationReport>,
}

pub struct CartIntegrator {
    store: Arc<dyn CartStore>,
    events: CartEvents,
    engine: Arc<RecommendationEngine>,
    settle_delay: Duration,
}

impl CartIntegrator {
    pub fn new(
        store: Arc<dyn CartStore>,
        events: CartEvents,
        engine: Arc<RecommendationEngine>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store,
            events,
            engine,
            settle_delay,
        }
    }

    pub fn events(&self) -> &CartEvents {
        &self.events
    }

    /// Adds one unit of the selected product unless it is already in the cart.
    /// A store failure is reported as `ProductUnavailable` and not retried.
    pub async fn apply(
        &self,
        session_id: &str,
        selection: &CatalogProduct,
        cart_lines: &[CartLine],
    ) -> ApplyOutcome {
        if contains_product(cart_lines, &selection.id) {
            tracing::info!(
                session_id = %session_id,
                product_id = %selection.id,
                "Selected product is already in the cart"
            );
            return ApplyOutcome::AlreadyInCart;
        }

        match self.store.add_item(session_id, selection, 1).await {
            Ok(()) => {
                tracing::info!(
                    session_id = %session_id,
                    product_id = %selection.id,
                    "Recommendation added to cart"
                );
                self.events.publish(CartEvent::Changed {
                    session_id: session_id.to_string(),
                    product_id: selection.id.clone(),
                    quantity: 1,
                });
                ApplyOutcome::Added
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    product_id = %selection.id,
                    error = %e,
                    "Cart rejected the recommended product"
                );
                ApplyOutcome::ProductUnavailable
            }
        }
    }

    pub async fn apply_recommendation(
        &self,
        session_id: &str,
        selection: &AggregatedRecommendation,
        cart_lines: &[CartLine],
    ) -> ApplyOutcome {
        self.apply(session_id, &selection.product, cart_lines).await
    }

    /// Applies `product_id` against the live cart and, after the settle delay,
    /// runs a fresh pass over the updated cart
    pub async fn apply_and_refresh(
        &self,
        session_id: &str,
        product_id: &str,
        catalog: &Catalog,
        context: &RecommendationContext,
    ) -> AppResult<CartUpdate> {
        let Some(product) = catalog.get(product_id) else {
            tracing::warn!(session_id = %session_id, product_id = %product_id, "Selected product is not on the menu");
            return Ok(CartUpdate {
                outcome: ApplyOutcome::ProductUnavailable,
                recommendations: None,
            });
        };

        let lines = self.store.lines(session_id).await?;
        let outcome = self.apply(session_id, product, &lines).await;
        if outcome != ApplyOutcome::Added {
            return Ok(CartUpdate {
                outcome,
                recommendations: None,
            });
        }

        tokio::time::sleep(self.settle_delay).await;
        let lines = self.store.lines(session_id).await?;
        let report = self.engine.recommend(&lines, catalog, context).await;

        Ok(CartUpdate {
            outcome,
            recommendations: Some(report),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeOfDay;
    use crate::services::aggregator::WeightTable;
    use crate::services::providers::DisabledAdvisor;
    use crate::services::sources::fixtures::{line, menu};
    use crate::services::sources::AiAdvisor;

    fn engine() -> Arc<RecommendationEngine> {
        let advisor = AiAdvisor::new(Arc::new(DisabledAdvisor), Duration::from_secs(1));
        Arc::new(RecommendationEngine::new(advisor, WeightTable::default(), 8))
    }

    fn integrator(store: Arc<dyn CartStore>) -> CartIntegrator {
        CartIntegrator::new(store, CartEvents::new(), engine(), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_already_in_cart_never_touches_store() {
        let catalog = menu();
        let cart = vec![line(&catalog, "ayran", 1)];

        let mut store = MockCartStore::new();
        store.expect_add_item().times(0);
        let integrator = integrator(Arc::new(store));
        let mut events = integrator.events().subscribe();

        let outcome = integrator
            .apply("s1", catalog.get("ayran").unwrap(), &cart)
            .await;
        assert_eq!(outcome, ApplyOutcome::AlreadyInCart);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_store_failure_is_product_unavailable_without_retry() {
        let catalog = menu();
        let cart = vec![line(&catalog, "kebap-adana", 1)];

        let mut store = MockCartStore::new();
        store
            .expect_add_item()
            .times(1)
            .returning(|_, _, _| Err(AppError::CartMutation("out of stock".to_string())));
        let integrator = integrator(Arc::new(store));

        let outcome = integrator
            .apply("s1", catalog.get("ayran").unwrap(), &cart)
            .await;
        assert_eq!(outcome, ApplyOutcome::ProductUnavailable);
    }

    #[tokio::test]
    async fn test_added_publishes_change_event() {
        let catalog = menu();
        let store = Arc::new(InMemoryCartStore::new());
        let integrator = integrator(store.clone());
        let mut events = integrator.events().subscribe();

        let selection = AggregatedRecommendation {
            product_id: "ayran".to_string(),
            product: catalog.get("ayran").unwrap().clone(),
            combined_score: 40.0,
            reasons: vec!["Completes a main-dish order".to_string()],
            urgency: crate::models::Urgency::High,
            confidence: 0.0,
            dominant_category: crate::models::SourceCategory::AiPowered,
        };
        let outcome = integrator.apply_recommendation("s1", &selection, &[]).await;
        assert_eq!(outcome, ApplyOutcome::Added);

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            CartEvent::Changed {
                session_id: "s1".to_string(),
                product_id: "ayran".to_string(),
                quantity: 1,
            }
        );
        assert_eq!(store.lines("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_and_refresh_recomputes_without_new_item() {
        let catalog = menu();
        let store = Arc::new(InMemoryCartStore::new());
        store
            .add_item("s1", catalog.get("kebap-adana").unwrap(), 1)
            .await
            .unwrap();
        let integrator = integrator(store.clone());
        let context = RecommendationContext::new(TimeOfDay::Evening, None);

        let update = integrator
            .apply_and_refresh("s1", "ayran", &catalog, &context)
            .await
            .unwrap();
        assert_eq!(update.outcome, ApplyOutcome::Added);

        let report = update.recommendations.unwrap();
        assert!(report.recommendations.iter().all(|r| r.product_id != "ayran"));
        assert!(report.recommendations.iter().all(|r| r.product_id != "kebap-adana"));
    }

    #[tokio::test]
    async fn test_apply_and_refresh_unknown_product() {
        let catalog = menu();
        let integrator = integrator(Arc::new(InMemoryCartStore::new()));
        let context = RecommendationContext::new(TimeOfDay::Evening, None);

        let update = integrator
            .apply_and_refresh("s1", "ghost", &catalog, &context)
            .await
            .unwrap();
        assert_eq!(update.outcome, ApplyOutcome::ProductUnavailable);
        assert!(update.recommendations.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store_increments_quantity() {
        let catalog = menu();
        let store = InMemoryCartStore::new();
        let cay = catalog.get("cay").unwrap();

        tokio_test::assert_ok!(store.add_item("s1", cay, 1).await);
        tokio_test::assert_ok!(store.add_item("s1", cay, 2).await);
        tokio_test::assert_err!(store.add_item("s1", cay, 0).await);

        let lines = store.lines("s1").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
        assert!(store.lines("other").await.unwrap().is_empty());
    }
}
