use crate::{
    error::AppResult,
    models::{RawRecommendation, Season, SourceCategory, TimeOfDay, Urgency},
};

use super::{contains_any, keyword_haystack, rank_and_cap, SignalInput, SignalSource, MAX_PER_SOURCE};

struct TimeRule {
    bucket: TimeOfDay,
    score: f64,
    reason: &'static str,
    keywords: &'static [&'static str],
}

struct SeasonRule {
    season: Season,
    reason: &'static str,
    keywords: &'static [&'static str],
}

const SEASONAL_BONUS: f64 = 20.0;

const TIME_RULES: &[TimeRule] = &[
    TimeRule {
        bucket: TimeOfDay::Morning,
        score: 90.0,
        reason: "A breakfast favourite",
        keywords: &[
            "kahvaltı", "breakfast", "menemen", "simit", "börek", "omlet", "poğaça", "çay",
            "kahve", "coffee",
        ],
    },
    TimeRule {
        bucket: TimeOfDay::Midday,
        score: 85.0,
        reason: "Popular at lunchtime",
        keywords: &[
            "çorba", "soup", "dürüm", "wrap", "salata", "salad", "pide", "lahmacun", "tost",
            "sandwich",
        ],
    },
    TimeRule {
        bucket: TimeOfDay::Evening,
        score: 80.0,
        reason: "Popular for dinner",
        keywords: &[
            "kebap", "kebab", "ızgara", "izgara", "grill", "pizza", "burger", "köfte", "mantı",
            "tatlı",
        ],
    },
];

const SEASON_RULES: &[SeasonRule] = &[
    SeasonRule {
        season: Season::Winter,
        reason: "A warming choice for winter",
        keywords: &["çorba", "soup", "salep", "sahlep", "sıcak", "hot", "çay", "kahve"],
    },
    SeasonRule {
        season: Season::Summer,
        reason: "Refreshing in summer",
        keywords: &[
            "ayran", "limonata", "lemonade", "dondurma", "ice cream", "soğuk", "cold", "iced",
            "salata", "salad",
        ],
    },
];

/// Scores products against the caller-supplied time bucket and season
#[derive(Debug, Clone, Default)]
pub struct ContextualAdvisor;

impl ContextualAdvisor {
    pub fn new() -> Self {
        Self
    }
}

fn urgency_for(score: f64) -> Urgency {
    if score >= 100.0 {
        Urgency::High
    } else if score >= 85.0 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

#[async_trait::async_trait]
impl SignalSource for ContextualAdvisor {
    async fn produce(&self, input: &SignalInput<'_>) -> AppResult<Vec<RawRecommendation>> {
        let time_rule = TIME_RULES
            .iter()
            .find(|r| r.bucket == input.context.time_of_day);
        let season_rule = input
            .context
            .season
            .and_then(|season| SEASON_RULES.iter().find(|r| r.season == season));

        let mut recommendations = Vec::new();

        for product in input.candidates() {
            let haystack = keyword_haystack(product);
            let mut score = 0.0;
            let mut reasons = Vec::new();

            if let Some(rule) = time_rule.filter(|r| contains_any(&haystack, r.keywords)) {
                score += rule.score;
                reasons.push(rule.reason.to_string());
            }

            if let Some(rule) = season_rule.filter(|r| contains_any(&haystack, r.keywords)) {
                score += SEASONAL_BONUS;
                reasons.push(rule.reason.to_string());
            }

            if score <= 0.0 {
                continue;
            }

            let mut rec = RawRecommendation::new(
                product.id.clone(),
                SourceCategory::Contextual,
                score,
                String::new(),
            )
            .with_urgency(urgency_for(score))
            .with_confidence(score / 100.0);
            rec.reasons = reasons;

            recommendations.push(rec);
        }

        Ok(rank_and_cap(recommendations, input.catalog, MAX_PER_SOURCE))
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Contextual
    }

    fn name(&self) -> &'static str {
        "contextual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationContext;
    use crate::services::sources::fixtures::{line, menu};

    #[tokio::test]
    async fn test_seasonal_reason_is_appended_to_time_reason() {
        let catalog = menu();
        let cart = vec![line(&catalog, "kebap-adana", 1)];
        let context = RecommendationContext::new(TimeOfDay::Morning, Some(Season::Winter));

        let recs = ContextualAdvisor::new()
            .produce(&SignalInput::new(&cart, &catalog, &context))
            .await
            .unwrap();

        let cay = &recs[0];
        assert_eq!(cay.product_id, "cay");
        assert_eq!(cay.raw_score, 100.0);
        assert_eq!(cay.urgency, Urgency::High);
        assert_eq!(
            cay.reasons,
            vec![
                "A breakfast favourite".to_string(),
                "A warming choice for winter".to_string()
            ]
        );
        assert_eq!(recs[1].product_id, "kahve");
        assert_eq!(recs[2].product_id, "menemen");
        assert_eq!(recs[2].raw_score, 90.0);
    }

    #[tokio::test]
    async fn test_without_season_only_time_bucket_scores() {
        let catalog = menu();
        let cart = vec![line(&catalog, "ayran", 1)];
        let context = RecommendationContext::new(TimeOfDay::Midday, None);

        let recs = ContextualAdvisor::new()
            .produce(&SignalInput::new(&cart, &catalog, &context))
            .await
            .unwrap();

        let ids: Vec<&str> = recs.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["lahmacun", "mercimek", "coban"]);
        assert!(recs.iter().all(|r| r.raw_score == 85.0));
        assert!(recs.iter().all(|r| r.urgency == Urgency::Medium));
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let catalog = menu();
        let cart = vec![line(&catalog, "ayran", 1)];
        let context = RecommendationContext::new(TimeOfDay::Evening, Some(Season::Winter));

        let recs = ContextualAdvisor::new()
            .produce(&SignalInput::new(&cart, &catalog, &context))
            .await
            .unwrap();

        assert_eq!(recs.len(), MAX_PER_SOURCE);
        assert!(recs.windows(2).all(|w| w[0].raw_score >= w[1].raw_score));
        assert_eq!(recs[0].product_id, "kebap-adana");
    }
}
