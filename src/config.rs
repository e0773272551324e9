use serde::Deserialize;
use std::time::Duration;

use crate::{error::AppResult, services::aggregator::WeightTable};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL; enables the advisor response cache when set
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Generative AI API key; the advisor is disabled without one
    #[serde(default)]
    pub advisor_api_key: Option<String>,

    /// Generative AI API base URL
    #[serde(default = "default_advisor_api_url")]
    pub advisor_api_url: String,

    #[serde(default = "default_advisor_model")]
    pub advisor_model: String,

    #[serde(default = "default_advisor_max_tokens")]
    pub advisor_max_tokens: u32,

    /// Upper bound on a single advisor call
    #[serde(default = "default_advisor_timeout_ms")]
    pub advisor_timeout_ms: u64,

    /// How long an advisor answer is reused for an identical cart
    #[serde(default = "default_advisor_cache_ttl_secs")]
    pub advisor_cache_ttl_secs: u64,

    /// Maximum recommendations returned per pass
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Debounce between a cart change and the follow-up pass
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_weight_ai")]
    pub weight_ai: f64,

    #[serde(default = "default_weight_trending")]
    pub weight_trending: f64,

    #[serde(default = "default_weight_similarity")]
    pub weight_similarity: f64,

    #[serde(default = "default_weight_contextual")]
    pub weight_contextual: f64,

    #[serde(default = "default_weight_complementary")]
    pub weight_complementary: f64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_advisor_api_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_advisor_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_advisor_max_tokens() -> u32 {
    1024
}

fn default_advisor_timeout_ms() -> u64 {
    10_000
}

fn default_advisor_cache_ttl_secs() -> u64 {
    900
}

fn default_max_recommendations() -> usize {
    8
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_weight_ai() -> f64 {
    0.30
}

fn default_weight_trending() -> f64 {
    0.20
}

fn default_weight_similarity() -> f64 {
    0.20
}

fn default_weight_contextual() -> f64 {
    0.15
}

fn default_weight_complementary() -> f64 {
    0.15
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            advisor_api_key: None,
            advisor_api_url: default_advisor_api_url(),
            advisor_model: default_advisor_model(),
            advisor_max_tokens: default_advisor_max_tokens(),
            advisor_timeout_ms: default_advisor_timeout_ms(),
            advisor_cache_ttl_secs: default_advisor_cache_ttl_secs(),
            max_recommendations: default_max_recommendations(),
            settle_delay_ms: default_settle_delay_ms(),
            weight_ai: default_weight_ai(),
            weight_trending: default_weight_trending(),
            weight_similarity: default_weight_similarity(),
            weight_contextual: default_weight_contextual(),
            weight_complementary: default_weight_complementary(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Builds the source weight table, rejecting tables that do not sum to 1.0
    pub fn weight_table(&self) -> AppResult<WeightTable> {
        WeightTable::new(
            self.weight_ai,
            self.weight_trending,
            self.weight_similarity,
            self.weight_contextual,
            self.weight_complementary,
        )
    }

    pub fn advisor_timeout(&self) -> Duration {
        Duration::from_millis(self.advisor_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
