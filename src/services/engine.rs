/// One full recommendation pass: every source, the fallback rules, the aggregator
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    models::{AggregatedRecommendation, CartLine, Catalog, RecommendationContext, SourceCategory},
    services::{
        aggregator::{aggregate, WeightTable},
        sources::{
            AdvisorInsight, AiAdvisor, ComplementaryRuleEngine, ContextualAdvisor,
            FallbackRuleEngine, SignalInput, SignalSource, SimilarityMatcher, TrendAnalyzer,
        },
    },
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<AggregatedRecommendation>,
    /// True when the advisor returned nothing and the fallback rules ran
    pub fallback_used: bool,
    pub failed_sources: Vec<SourceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisor_insight: Option<AdvisorInsight>,
}

pub struct RecommendationEngine {
    advisor: AiAdvisor,
    fallback: FallbackRuleEngine,
    sources: Vec<Arc<dyn SignalSource>>,
    weights: WeightTable,
    max_results: usize,
}

impl RecommendationEngine {
    /// Engine with the four rule-based sources alongside the advisor
    pub fn new(advisor: AiAdvisor, weights: WeightTable, max_results: usize) -> Self {
        let sources: Vec<Arc<dyn SignalSource>> = vec![
            Arc::new(TrendAnalyzer::new()),
            Arc::new(SimilarityMatcher::new()),
            Arc::new(ContextualAdvisor::new()),
            Arc::new(ComplementaryRuleEngine::new()),
        ];
        Self::with_sources(advisor, sources, weights, max_results)
    }

    pub fn with_sources(
        advisor: AiAdvisor,
        sources: Vec<Arc<dyn SignalSource>>,
        weights: WeightTable,
        max_results: usize,
    ) -> Self {
        Self {
            advisor,
            fallback: FallbackRuleEngine::new(),
            sources,
            weights,
            max_results,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub async fn recommend(
        &self,
        cart: &[CartLine],
        catalog: &Catalog,
        context: &RecommendationContext,
    ) -> RecommendationReport {
        if cart.is_empty() || catalog.is_empty() {
            tracing::debug!(
                cart_lines = cart.len(),
                catalog_size = catalog.len(),
                "Nothing to recommend against"
            );
            return RecommendationReport::default();
        }

        let input = SignalInput::new(cart, catalog, context);
        tracing::info!(
            cart_lines = cart.len(),
            catalog_size = catalog.len(),
            time_of_day = ?context.time_of_day,
            season = ?context.season,
            "Starting recommendation pass"
        );

        let advice = self.advisor.advise(&input).await;
        let mut raw = advice.recommendations;
        let fallback_used = raw.is_empty();
        if fallback_used {
            raw = self.fallback.recommend(&input);
            tracing::info!(fallback_count = raw.len(), "Advisor empty, using fallback rules");
        }

        let mut failed_sources = Vec::new();
        for source in &self.sources {
            match source.produce(&input).await {
                Ok(produced) => {
                    tracing::debug!(source = source.name(), count = produced.len(), "Source contributed");
                    raw.extend(produced);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "Source failed, skipping");
                    failed_sources.push(source.category());
                }
            }
        }

        let recommendations = aggregate(&raw, cart, catalog, &self.weights, self.max_results);

        tracing::info!(
            raw_count = raw.len(),
            recommended = recommendations.len(),
            fallback_used,
            failed = failed_sources.len(),
            "Recommendation pass complete"
        );

        RecommendationReport {
            recommendations,
            fallback_used,
            failed_sources,
            advisor_insight: advice.insight,
        }
    }
}
