use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::Catalog,
    services::{
        providers::AdvisorClient, sources::AiAdvisor, CartEvents, CartIntegrator, CartStore,
        InMemoryCartStore, RecommendationEngine,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub engine: Arc<RecommendationEngine>,
    pub integrator: Arc<CartIntegrator>,
    pub carts: Arc<dyn CartStore>,
}

/// Catalog and trend snapshots per restaurant
#[derive(Default)]
pub struct AppStateInner {
    pub catalogs: HashMap<String, Catalog>,
    pub order_counts: HashMap<String, HashMap<String, u32>>,
}

impl AppState {
    /// Wires the engine and cart integrator around the given advisor.
    /// Fails when the configured weight table is invalid.
    pub fn new(advisor: Arc<dyn AdvisorClient>, config: &Config) -> AppResult<Self> {
        let weights = config.weight_table()?;
        let advisor = AiAdvisor::new(advisor, config.advisor_timeout());
        let engine = Arc::new(RecommendationEngine::new(
            advisor,
            weights,
            config.max_recommendations,
        ));

        let carts: Arc<dyn CartStore> = Arc::new(InMemoryCartStore::new());
        let integrator = Arc::new(CartIntegrator::new(
            carts.clone(),
            CartEvents::new(),
            engine.clone(),
            config.settle_delay(),
        ));

        Ok(Self {
            inner: Arc::new(RwLock::new(AppStateInner::default())),
            engine,
            integrator,
            carts,
        })
    }

    /// Cloned catalog snapshot so no lock is held across a pass
    pub async fn catalog(&self, restaurant_id: &str) -> AppResult<Catalog> {
        let inner = self.inner.read().await;
        inner
            .catalogs
            .get(restaurant_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No catalog loaded for restaurant {}", restaurant_id)))
    }

    pub async fn order_counts(&self, restaurant_id: &str) -> HashMap<String, u32> {
        let inner = self.inner.read().await;
        inner.order_counts.get(restaurant_id).cloned().unwrap_or_default()
    }
}
