/// AI-powered signal source
///
/// Wraps an [`AdvisorClient`] with a timeout, pulls the structured block out
/// of the free-text answer and keeps only suggestions that resolve to real
/// catalog products. Every failure collapses to an empty result so the pass
/// can fall through to the fallback rules.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AdvisorError, AppError, AppResult},
    models::{Catalog, RawRecommendation, SourceCategory, Urgency},
    services::{
        extraction::{self, ExtractionError},
        providers::{AdvisorClient, AdvisorRequest},
        resolver,
    },
};

use super::{SignalInput, SignalSource};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvisorPayload {
    #[serde(default)]
    missing_categories: Vec<String>,
    recommendations: Vec<AdvisorSuggestion>,
    #[serde(default)]
    bundles: Vec<AdvisorBundle>,
    #[serde(default)]
    satisfaction: Option<Value>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdvisorSuggestion {
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    price: Option<Value>,
    #[serde(alias = "compatibilityPercent")]
    compatibility: Value,
    #[serde(default, alias = "urgencyLabel")]
    urgency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdvisorBundle {
    name: String,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// A bundle whose items all resolved to catalog products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSuggestion {
    pub name: String,
    pub product_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Side information from the advisor that does not feed the score blend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisorInsight {
    pub missing_categories: Vec<String>,
    pub bundles: Vec<BundleSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvisorOutcome {
    pub recommendations: Vec<RawRecommendation>,
    pub insight: Option<AdvisorInsight>,
}

pub struct AiAdvisor {
    client: Arc<dyn AdvisorClient>,
    timeout: Duration,
}

impl AiAdvisor {
    pub fn new(client: Arc<dyn AdvisorClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Runs one advisor round trip. Never fails; an empty outcome means the
    /// caller should use the fallback rules.
    pub async fn advise(&self, input: &SignalInput<'_>) -> AdvisorOutcome {
        match self.try_advise(input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    provider = self.client.name(),
                    "Advisor produced no usable suggestions"
                );
                AdvisorOutcome::default()
            }
        }
    }

    async fn try_advise(&self, input: &SignalInput<'_>) -> Result<AdvisorOutcome, AdvisorError> {
        let request = AdvisorRequest::from_snapshot(input.cart, input.catalog);

        let text = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| AdvisorError::Timeout(self.timeout))?
            .map_err(|e| match e {
                AppError::Advisor(inner) => inner,
                other => AdvisorError::Unavailable(other.to_string()),
            })?;

        let payload = parse_payload(&text)?;
        Ok(interpret(payload, input.catalog))
    }
}

fn parse_payload(text: &str) -> Result<AdvisorPayload, AdvisorError> {
    extraction::extract(text).map_err(|e| match e {
        ExtractionError::NoBlock => {
            AdvisorError::MalformedResponse("no structured block in response".to_string())
        }
        ExtractionError::Invalid(err) => AdvisorError::MalformedResponse(err.to_string()),
    })
}

/// Whether raw advisor text carries a block this source can use
pub fn is_well_formed(text: &str) -> bool {
    parse_payload(text).is_ok()
}

fn interpret(payload: AdvisorPayload, catalog: &Catalog) -> AdvisorOutcome {
    let mut seen = HashSet::new();
    let mut recommendations = Vec::with_capacity(payload.recommendations.len());

    for suggestion in payload.recommendations {
        let Some(product) = resolver::resolve(&suggestion.name, catalog) else {
            tracing::debug!(name = %suggestion.name, "Dropping advisor suggestion with no catalog match");
            continue;
        };
        let Some(compatibility) = as_number(&suggestion.compatibility) else {
            tracing::debug!(name = %suggestion.name, "Dropping advisor suggestion without a usable compatibility");
            continue;
        };
        if !seen.insert(product.id.clone()) {
            continue;
        }

        let compatibility = compatibility.clamp(0.0, 100.0);
        let reason = suggestion
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| match &suggestion.category {
                Some(category) => format!("Suggested to round out the order ({})", category),
                None => "Suggested to round out the order".to_string(),
            });
        let urgency = suggestion
            .urgency
            .as_deref()
            .map(Urgency::from_label)
            .unwrap_or(Urgency::Low);

        recommendations.push(
            RawRecommendation::new(&product.id, SourceCategory::AiPowered, compatibility, reason)
                .with_urgency(urgency)
                .with_confidence(compatibility / 100.0),
        );
    }

    let bundles = payload
        .bundles
        .into_iter()
        .filter_map(|bundle| {
            let product_ids: Vec<String> = bundle
                .items
                .iter()
                .filter_map(|item| resolver::resolve(item, catalog).map(|p| p.id.clone()))
                .collect();
            if product_ids.is_empty() {
                return None;
            }
            Some(BundleSuggestion {
                name: bundle.name,
                product_ids,
                reason: bundle.reason,
            })
        })
        .collect();

    let insight = AdvisorInsight {
        missing_categories: payload.missing_categories,
        bundles,
        satisfaction: payload.satisfaction.as_ref().and_then(as_number),
        reasoning: payload.reasoning,
    };

    tracing::info!(
        accepted = recommendations.len(),
        bundles = insight.bundles.len(),
        "Advisor suggestions resolved"
    );

    AdvisorOutcome {
        recommendations,
        insight: Some(insight),
    }
}

/// Accepts `85`, `85.5`, `"85"` and `"85%"`
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[async_trait::async_trait]
impl SignalSource for AiAdvisor {
    async fn produce(&self, input: &SignalInput<'_>) -> AppResult<Vec<RawRecommendation>> {
        Ok(self.advise(input).await.recommendations)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::AiPowered
    }

    fn name(&self) -> &'static str {
        "ai-advisor"
    }
}
