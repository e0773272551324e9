use crate::{
    error::AppResult,
    models::{RawRecommendation, SourceCategory, Urgency},
};

use super::{rank_and_cap, SignalInput, SignalSource, MAX_PER_SOURCE};

/// Domain pairing rule: when a trigger is in the cart, suggest the partners
pub struct PairingRule {
    pub triggers: &'static [&'static str],
    pub suggestions: &'static [&'static str],
    pub score: f64,
    pub reason: &'static str,
}

pub const PAIRING_RULES: &[PairingRule] = &[
    PairingRule {
        triggers: &["kebap", "kebab", "döner", "adana", "urfa", "köfte", "ızgara", "izgara"],
        suggestions: &["ayran", "şalgam", "salata"],
        score: 85.0,
        reason: "A classic pairing with grilled meat",
    },
    PairingRule {
        triggers: &["baklava", "künefe", "kadayıf", "sütlaç", "tatlı"],
        suggestions: &["çay", "kahve"],
        score: 80.0,
        reason: "Tea or coffee is the traditional post-dessert pairing",
    },
    PairingRule {
        triggers: &["lahmacun", "pide"],
        suggestions: &["ayran", "salata"],
        score: 80.0,
        reason: "Traditionally served alongside lahmacun and pide",
    },
    PairingRule {
        triggers: &["pizza", "burger", "hamburger"],
        suggestions: &["cola", "patates", "fries"],
        score: 75.0,
        reason: "Goes well with fast food",
    },
    PairingRule {
        triggers: &["çorba", "soup"],
        suggestions: &["ekmek", "bread", "salata"],
        score: 70.0,
        reason: "Completes a soup course",
    },
];

/// Fixed domain pairing rules over cart product names
#[derive(Debug, Clone, Default)]
pub struct ComplementaryRuleEngine;

impl ComplementaryRuleEngine {
    pub fn new() -> Self {
        Self
    }
}

fn urgency_for(score: f64) -> Urgency {
    if score >= 85.0 {
        Urgency::High
    } else if score >= 75.0 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

#[async_trait::async_trait]
impl SignalSource for ComplementaryRuleEngine {
    async fn produce(&self, input: &SignalInput<'_>) -> AppResult<Vec<RawRecommendation>> {
        let cart_names = input
            .cart
            .iter()
            .map(|line| line.name().to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let mut recommendations: Vec<RawRecommendation> = Vec::new();

        for rule in PAIRING_RULES {
            if !rule.triggers.iter().any(|t| cart_names.contains(t)) {
                continue;
            }

            for keyword in rule.suggestions {
                let Some(product) = input
                    .candidates()
                    .find(|p| p.name.to_lowercase().contains(keyword))
                else {
                    continue;
                };

                // Earlier rules score at least as high; keep one entry per product
                if recommendations.iter().any(|r| r.product_id == product.id) {
                    continue;
                }

                recommendations.push(
                    RawRecommendation::new(
                        product.id.clone(),
                        SourceCategory::Complementary,
                        rule.score,
                        rule.reason,
                    )
                    .with_urgency(urgency_for(rule.score))
                    .with_confidence(rule.score / 100.0),
                );
            }
        }

        Ok(rank_and_cap(recommendations, input.catalog, MAX_PER_SOURCE))
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Complementary
    }

    fn name(&self) -> &'static str {
        "complementary"
    }
}
