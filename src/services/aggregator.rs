/// Weighted merge of raw recommendations into the ranked list shown to the customer
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{
        contains_product, AggregatedRecommendation, CartLine, Catalog, CatalogProduct,
        RawRecommendation, SourceCategory, Urgency,
    },
};

const WEIGHT_EPSILON: f64 = 1e-9;

/// Per-source weight fractions. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    ai: f64,
    trending: f64,
    similarity: f64,
    contextual: f64,
    complementary: f64,
}

impl WeightTable {
    pub fn new(
        ai: f64,
        trending: f64,
        similarity: f64,
        contextual: f64,
        complementary: f64,
    ) -> AppResult<Self> {
        let table = Self {
            ai,
            trending,
            similarity,
            contextual,
            complementary,
        };

        if let Some(source) = SourceCategory::ALL
            .into_iter()
            .find(|s| !(table.weight(*s).is_finite() && table.weight(*s) >= 0.0))
        {
            return Err(AppError::InvalidConfig(format!(
                "weight for {} must be a non-negative number, got {}",
                source,
                table.weight(source)
            )));
        }

        let sum = table.sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(AppError::InvalidConfig(format!(
                "source weights must sum to 1.0, got {}",
                sum
            )));
        }

        Ok(table)
    }

    pub fn weight(&self, source: SourceCategory) -> f64 {
        match source {
            SourceCategory::AiPowered => self.ai,
            SourceCategory::Trending => self.trending,
            SourceCategory::Similar => self.similarity,
            SourceCategory::Contextual => self.contextual,
            SourceCategory::Complementary => self.complementary,
        }
    }

    pub fn sum(&self) -> f64 {
        SourceCategory::ALL.iter().map(|s| self.weight(*s)).sum()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            ai: 0.30,
            trending: 0.20,
            similarity: 0.20,
            contextual: 0.15,
            complementary: 0.15,
        }
    }
}

/// Merges every source's output into at most `limit` recommendations.
///
/// Groups by product, sums weighted scores, merges reasons in source-priority
/// order, drops cart products, then ranks by combined score with ties broken
/// by dominant-source priority and catalog order. Pure: identical inputs give
/// identical output.
pub fn aggregate(
    raw: &[RawRecommendation],
    cart: &[CartLine],
    catalog: &Catalog,
    weights: &WeightTable,
    limit: usize,
) -> Vec<AggregatedRecommendation> {
    // Groups kept in first-seen order so nothing depends on hash iteration
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&RawRecommendation>> = HashMap::new();
    for entry in raw {
        let group = groups.entry(entry.product_id.as_str()).or_default();
        if group.is_empty() {
            order.push(entry.product_id.as_str());
        }
        group.push(entry);
    }

    let mut merged: Vec<AggregatedRecommendation> = order
        .into_iter()
        .filter(|id| !contains_product(cart, id))
        .filter_map(|id| {
            let Some(product) = catalog.get(id) else {
                tracing::debug!(product_id = %id, "Dropping recommendation for product missing from catalog");
                return None;
            };
            let mut entries = groups.remove(id)?;
            entries.sort_by_key(|e| e.source.priority());
            Some(merge_group(product.clone(), &entries, weights))
        })
        .collect();

    merged.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| a.dominant_category.priority().cmp(&b.dominant_category.priority()))
            .then_with(|| catalog.position(&a.product_id).cmp(&catalog.position(&b.product_id)))
    });
    merged.truncate(limit);
    merged
}

/// `entries` must already be in source-priority order
fn merge_group(
    product: CatalogProduct,
    entries: &[&RawRecommendation],
    weights: &WeightTable,
) -> AggregatedRecommendation {
    let mut combined_score = 0.0;
    let mut reasons: Vec<String> = Vec::new();
    let mut urgency = Urgency::Low;
    let mut confidence: f64 = 0.0;
    let mut dominant: Option<(SourceCategory, f64)> = None;

    for entry in entries {
        let weighted = entry.raw_score * weights.weight(entry.source);
        combined_score += weighted;

        for reason in &entry.reasons {
            if !reasons.contains(reason) {
                reasons.push(reason.clone());
            }
        }

        urgency = urgency.max(entry.urgency);
        confidence = confidence.max(entry.confidence);

        // Strictly greater, so equal contributions keep the earlier source
        if dominant.map_or(true, |(_, best)| weighted > best) {
            dominant = Some((entry.source, weighted));
        }
    }

    AggregatedRecommendation {
        product_id: product.id.clone(),
        product,
        combined_score,
        reasons,
        urgency,
        confidence,
        dominant_category: dominant.map_or(SourceCategory::AiPowered, |(source, _)| source),
    }
}
