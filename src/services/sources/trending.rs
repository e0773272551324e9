use crate::{
    error::AppResult,
    models::{RawRecommendation, SourceCategory, Urgency},
};

use super::{SignalInput, SignalSource};

/// Scores products by their recent order count
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

fn urgency_for(order_count: u32) -> Urgency {
    if order_count > 20 {
        Urgency::High
    } else if order_count > 10 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

#[async_trait::async_trait]
impl SignalSource for TrendAnalyzer {
    async fn produce(&self, input: &SignalInput<'_>) -> AppResult<Vec<RawRecommendation>> {
        let recommendations = input
            .catalog
            .products()
            .iter()
            .filter_map(|product| {
                let count = input.context.order_count(&product.id);
                if count == 0 {
                    return None;
                }

                let raw_score = (f64::from(count) * 2.0).min(100.0);
                let confidence = (f64::from(count) / 30.0).min(1.0);

                Some(
                    RawRecommendation::new(
                        product.id.clone(),
                        SourceCategory::Trending,
                        raw_score,
                        format!("Ordered {} times recently", count),
                    )
                    .with_urgency(urgency_for(count))
                    .with_confidence(confidence),
                )
            })
            .collect();

        Ok(recommendations)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Trending
    }

    fn name(&self) -> &'static str {
        "trending"
    }
}
