use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{CatalogProduct, RawRecommendation, SourceCategory, Urgency},
};

use super::{rank_and_cap, SignalInput, SignalSource, MAX_PER_SOURCE};

const CATEGORY_WEIGHT: f64 = 0.4;
const TOKEN_WEIGHT: f64 = 0.6;
const MIN_SIMILARITY: f64 = 0.3;

/// Content-based matcher: same category plus shared name tokens
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher;

impl SimilarityMatcher {
    pub fn new() -> Self {
        Self
    }
}

/// Lowercased name tokens longer than two characters
fn name_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Share of the product's name tokens that also appear in the cart
fn token_overlap(product: &CatalogProduct, cart_tokens: &HashSet<String>) -> f64 {
    let tokens = name_tokens(&product.name);
    if tokens.is_empty() {
        return 0.0;
    }

    let shared = tokens.iter().filter(|t| cart_tokens.contains(*t)).count();
    shared as f64 / tokens.len() as f64
}

fn urgency_for(similarity: f64) -> Urgency {
    if similarity > 0.8 {
        Urgency::High
    } else if similarity > 0.6 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

#[async_trait::async_trait]
impl SignalSource for SimilarityMatcher {
    async fn produce(&self, input: &SignalInput<'_>) -> AppResult<Vec<RawRecommendation>> {
        let cart_tokens: HashSet<String> = input
            .cart
            .iter()
            .flat_map(|line| name_tokens(line.name()))
            .collect();

        let cart_categories: HashSet<String> = input
            .cart
            .iter()
            .map(|line| line.category.to_lowercase())
            .collect();

        let mut recommendations = Vec::new();

        for product in input.candidates() {
            let same_category = cart_categories.contains(&product.category.to_lowercase());
            let overlap = token_overlap(product, &cart_tokens);

            let similarity =
                CATEGORY_WEIGHT * if same_category { 1.0 } else { 0.0 } + TOKEN_WEIGHT * overlap;
            if similarity <= MIN_SIMILARITY {
                continue;
            }

            let reason = if overlap > 0.0 {
                let anchor = input
                    .cart
                    .iter()
                    .find(|line| {
                        name_tokens(line.name())
                            .iter()
                            .any(|t| name_tokens(&product.name).contains(t))
                    })
                    .map(|line| line.name().to_string())
                    .unwrap_or_default();
                format!("Similar to {}", anchor)
            } else {
                format!("More from {}", product.category)
            };

            recommendations.push(
                RawRecommendation::new(
                    product.id.clone(),
                    SourceCategory::Similar,
                    similarity * 100.0,
                    reason,
                )
                .with_urgency(urgency_for(similarity))
                .with_confidence(similarity),
            );
        }

        Ok(rank_and_cap(recommendations, input.catalog, MAX_PER_SOURCE))
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Similar
    }

    fn name(&self) -> &'static str {
        "similarity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, RecommendationContext, TimeOfDay};
    use crate::services::sources::fixtures::{line, menu};

    fn ctx() -> RecommendationContext {
        RecommendationContext::new(TimeOfDay::Evening, None)
    }

    #[tokio::test]
    async fn test_same_category_and_shared_token() {
        let catalog = menu();
        let cart = vec![line(&catalog, "kebap-adana", 1)];
        let context = ctx();

        let recs = SimilarityMatcher::new()
            .produce(&SignalInput::new(&cart, &catalog, &context))
            .await
            .unwrap();

        assert_eq!(recs.len(), 1);
        let urfa = &recs[0];
        assert_eq!(urfa.product_id, "kebap-urfa");
        // 0.4 category + 0.6 * (1 of 2 tokens shared)
        assert!((urfa.raw_score - 70.0).abs() < 1e-9);
        assert_eq!(urfa.urgency, Urgency::Medium);
        assert_eq!(urfa.reasons, vec!["Similar to Adana Kebap".to_string()]);
    }

    #[tokio::test]
    async fn test_category_only_match_passes_threshold() {
        let catalog = menu();
        let cart = vec![line(&catalog, "baklava", 1)];
        let context = ctx();

        let recs = SimilarityMatcher::new()
            .produce(&SignalInput::new(&cart, &catalog, &context))
            .await
            .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].product_id, "kunefe");
        assert!((recs[0].confidence - 0.4).abs() < 1e-9);
        assert_eq!(recs[0].urgency, Urgency::Low);
        assert_eq!(recs[0].reasons, vec!["More from Tatlı".to_string()]);
    }

    #[tokio::test]
    async fn test_output_capped_and_sorted() {
        let products = (0..8)
            .map(|i| {
                crate::models::CatalogProduct::new(
                    format!("p{}", i),
                    if i % 2 == 0 { format!("Tavuk Şiş {}", i) } else { format!("Izgara {}", i) },
                    "Izgara",
                    200.0,
                )
            })
            .collect();
        let catalog = Catalog::new(products);
        let cart = vec![line(&catalog, "p0", 1)];
        let context = ctx();

        let recs = SimilarityMatcher::new()
            .produce(&SignalInput::new(&cart, &catalog, &context))
            .await
            .unwrap();

        assert_eq!(recs.len(), MAX_PER_SOURCE);
        assert!(recs.windows(2).all(|w| w[0].raw_score >= w[1].raw_score));
        assert!(recs.iter().all(|r| r.product_id != "p0"));
        // Tavuk Şiş variants share every token with the cart and rank first
        assert_eq!(recs[0].product_id, "p2");
    }

    #[tokio::test]
    async fn test_empty_cart_yields_nothing() {
        let catalog = menu();
        let context = ctx();

        let recs = SimilarityMatcher::new()
            .produce(&SignalInput::new(&[], &catalog, &context))
            .await
            .unwrap();

        assert!(recs.is_empty());
    }
}
