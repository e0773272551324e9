/// Recommendation signal sources
///
/// Each source looks at the same cart and catalog snapshot and independently
/// proposes products. Sources never exclude cart-resident products on behalf
/// of the aggregator; a few skip them only so capped output is not wasted.
use crate::{
    error::AppResult,
    models::{
        contains_product, CartLine, Catalog, CatalogProduct, RawRecommendation,
        RecommendationContext, SourceCategory,
    },
};

pub mod advisor;
pub mod complementary;
pub mod contextual;
pub mod fallback;
pub mod similarity;
pub mod trending;

pub use advisor::{AdvisorInsight, AiAdvisor};
pub use complementary::ComplementaryRuleEngine;
pub use contextual::ContextualAdvisor;
pub use fallback::FallbackRuleEngine;
pub use similarity::SimilarityMatcher;
pub use trending::TrendAnalyzer;

/// Cap applied by the similarity, contextual and complementary sources
pub const MAX_PER_SOURCE: usize = 5;

/// Read-only snapshot shared by every source in one pass
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub cart: &'a [CartLine],
    pub catalog: &'a Catalog,
    pub context: &'a RecommendationContext,
}

impl<'a> SignalInput<'a> {
    pub fn new(
        cart: &'a [CartLine],
        catalog: &'a Catalog,
        context: &'a RecommendationContext,
    ) -> Self {
        Self {
            cart,
            catalog,
            context,
        }
    }

    /// Catalog products that are not already in the cart, in catalog order
    pub fn candidates(&self) -> impl Iterator<Item = &'a CatalogProduct> + 'a {
        let cart = self.cart;
        self.catalog
            .products()
            .iter()
            .filter(move |p| !contains_product(cart, &p.id))
    }
}

/// Trait for recommendation signal sources
///
/// Implementations turn a cart snapshot into unweighted suggestions. An `Err`
/// only silences this source for the current pass.
#[async_trait::async_trait]
pub trait SignalSource: Send + Sync {
    async fn produce(&self, input: &SignalInput<'_>) -> AppResult<Vec<RawRecommendation>>;

    /// Category stamped on every recommendation this source emits
    fn category(&self) -> SourceCategory;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Sorts by raw score descending (catalog order on ties) and keeps the top `limit`
pub(crate) fn rank_and_cap(
    mut recommendations: Vec<RawRecommendation>,
    catalog: &Catalog,
    limit: usize,
) -> Vec<RawRecommendation> {
    recommendations.sort_by(|a, b| {
        b.raw_score.total_cmp(&a.raw_score).then_with(|| {
            catalog
                .position(&a.product_id)
                .cmp(&catalog.position(&b.product_id))
        })
    });
    recommendations.truncate(limit);
    recommendations
}

/// Lowercased "name category description" haystack for keyword tests
pub(crate) fn keyword_haystack(product: &CatalogProduct) -> String {
    let mut text = format!("{} {}", product.name, product.category);
    if let Some(description) = &product.description {
        text.push(' ');
        text.push_str(description);
    }
    text.to_lowercase()
}

pub(crate) fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}
