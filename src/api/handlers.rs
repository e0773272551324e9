use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{CartLine, CatalogProduct, Catalog, RecommendationContext, Season, TimeOfDay},
    services::{CartEvent, CartUpdate, RecommendationReport},
};

use super::AppState;

// Request/Response types

/// Optional context overrides; anything omitted is taken from the local clock
#[derive(Debug, Default, Deserialize)]
pub struct ContextParams {
    pub time_of_day: Option<TimeOfDay>,
    pub season: Option<Season>,
    pub hour: Option<u32>,
    pub month: Option<u32>,
}

impl ContextParams {
    pub fn resolve(&self) -> RecommendationContext {
        let now = Local::now();
        let time_of_day = self
            .time_of_day
            .unwrap_or_else(|| TimeOfDay::from_hour(self.hour.unwrap_or_else(|| now.hour())));
        let season = self
            .season
            .or_else(|| Season::from_month(self.month.unwrap_or_else(|| now.month())));
        RecommendationContext::new(time_of_day, season)
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogLoaded {
    pub restaurant_id: String,
    pub products: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub restaurant_id: String,
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub restaurant_id: String,
    #[serde(flatten)]
    pub context: ContextParams,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub restaurant_id: String,
    pub product_id: String,
    #[serde(flatten)]
    pub context: ContextParams,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Replace a restaurant's catalog snapshot
pub async fn put_catalog(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    Json(products): Json<Vec<CatalogProduct>>,
) -> AppResult<Json<CatalogLoaded>> {
    validate_catalog(&products)?;

    let loaded = CatalogLoaded {
        restaurant_id: restaurant_id.clone(),
        products: products.len(),
    };

    let mut inner = state.inner.write().await;
    inner.catalogs.insert(restaurant_id.clone(), Catalog::new(products));
    tracing::info!(restaurant_id = %restaurant_id, products = loaded.products, "Catalog loaded");

    Ok(Json(loaded))
}

fn validate_catalog(products: &[CatalogProduct]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for product in products {
        if product.id.trim().is_empty() || product.name.trim().is_empty() {
            return Err(AppError::InvalidInput("products need a non-empty id and name".to_string()));
        }
        if !product.price.is_finite() || product.price < 0.0 {
            return Err(AppError::InvalidInput(format!("invalid price for product {}", product.id)));
        }
        if !seen.insert(product.id.as_str()) {
            return Err(AppError::InvalidInput(format!("duplicate product id {}", product.id)));
        }
    }
    Ok(())
}

/// Replace a restaurant's recent per-product order counts
pub async fn put_trends(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    Json(counts): Json<HashMap<String, u32>>,
) -> StatusCode {
    let products = counts.len();
    let mut inner = state.inner.write().await;
    inner.order_counts.insert(restaurant_id.clone(), counts);
    tracing::info!(restaurant_id = %restaurant_id, products, "Order counts loaded");
    StatusCode::NO_CONTENT
}

/// Current cart lines for a session
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Vec<CartLine>>> {
    Ok(Json(state.carts.lines(&session_id).await?))
}

/// Add a catalog product to the cart
pub async fn add_item(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> AppResult<(StatusCode, Json<Vec<CartLine>>)> {
    let catalog = state.catalog(&request.restaurant_id).await?;
    let product = catalog
        .get(&request.product_id)
        .ok_or_else(|| AppError::NotFound(format!("Product {} not on the menu", request.product_id)))?;

    state.carts.add_item(&session_id, product, request.quantity).await?;
    state.integrator.events().publish(CartEvent::Changed {
        session_id: session_id.clone(),
        product_id: product.id.clone(),
        quantity: request.quantity,
    });
    tracing::info!(
        session_id = %session_id,
        product_id = %product.id,
        quantity = request.quantity,
        "Item added to cart"
    );

    let lines = state.carts.lines(&session_id).await?;
    Ok((StatusCode::CREATED, Json(lines)))
}

/// Run a recommendation pass over the session's cart
pub async fn recommend(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendationReport>> {
    let catalog = state.catalog(&request.restaurant_id).await?;
    let context = request
        .context
        .resolve()
        .with_order_counts(state.order_counts(&request.restaurant_id).await);
    let lines = state.carts.lines(&session_id).await?;

    tracing::debug!(session_id = %session_id, restaurant_id = %request.restaurant_id, "Recommendation requested");
    let report = state.engine.recommend(&lines, &catalog, &context).await;
    Ok(Json(report))
}

/// Apply a selected recommendation and return the refreshed pass
pub async fn apply_recommendation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ApplyRequest>,
) -> AppResult<Json<CartUpdate>> {
    let catalog = state.catalog(&request.restaurant_id).await?;
    let context = request
        .context
        .resolve()
        .with_order_counts(state.order_counts(&request.restaurant_id).await);

    let update = state
        .integrator
        .apply_and_refresh(&session_id, &request.product_id, &catalog, &context)
        .await?;
    Ok(Json(update))
}
