use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::CatalogProduct;

/// Which signal source produced a raw recommendation
///
/// Declaration order is the source priority used for reason ordering and
/// tie-breaks: AI > trending > similar > contextual > complementary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCategory {
    AiPowered,
    Trending,
    Similar,
    Contextual,
    Complementary,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 5] = [
        SourceCategory::AiPowered,
        SourceCategory::Trending,
        SourceCategory::Similar,
        SourceCategory::Contextual,
        SourceCategory::Complementary,
    ];

    /// Lower is stronger
    pub fn priority(&self) -> u8 {
        *self as u8
    }
}

impl Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SourceCategory::AiPowered => "ai-powered",
            SourceCategory::Trending => "trending",
            SourceCategory::Similar => "similar",
            SourceCategory::Contextual => "contextual",
            SourceCategory::Complementary => "complementary",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    /// Lenient mapping of a free-text label, English or Turkish
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" | "urgent" | "yüksek" | "acil" => Urgency::High,
            "medium" | "moderate" | "orta" => Urgency::Medium,
            _ => Urgency::Low,
        }
    }
}

/// A single source's unweighted suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecommendation {
    pub product_id: String,
    pub source: SourceCategory,
    /// 0-100
    pub raw_score: f64,
    pub reasons: Vec<String>,
    pub urgency: Urgency,
    /// 0-1
    pub confidence: f64,
}

impl RawRecommendation {
    pub fn new(
        product_id: impl Into<String>,
        source: SourceCategory,
        raw_score: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            source,
            raw_score: raw_score.clamp(0.0, 100.0),
            reasons: vec![reason.into()],
            urgency: Urgency::Low,
            confidence: 0.0,
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// The merged, weighted suggestion surfaced to the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecommendation {
    pub product_id: String,
    pub product: CatalogProduct,
    pub combined_score: f64,
    pub reasons: Vec<String>,
    pub urgency: Urgency,
    pub confidence: f64,
    pub dominant_category: SourceCategory,
}
