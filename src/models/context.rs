use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse time-of-day bucket used by the contextual advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Midday,
    Evening,
}

impl TimeOfDay {
    /// Maps a 0-23 hour onto a bucket: 05-10 morning, 11-16 midday, otherwise evening
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=10 => TimeOfDay::Morning,
            11..=16 => TimeOfDay::Midday,
            _ => TimeOfDay::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Summer,
}

impl Season {
    /// December-February is winter, June-August summer; other months carry no season
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            6..=8 => Some(Season::Summer),
            _ => None,
        }
    }
}

/// Everything a pass needs besides the cart and the catalog
///
/// Time and season are always explicit so a pass never reads the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationContext {
    pub time_of_day: TimeOfDay,
    pub season: Option<Season>,
    /// Recent order count per product id, precomputed by the trend collaborator
    pub order_counts: HashMap<String, u32>,
}

impl RecommendationContext {
    pub fn new(time_of_day: TimeOfDay, season: Option<Season>) -> Self {
        Self {
            time_of_day,
            season,
            order_counts: HashMap::new(),
        }
    }

    pub fn with_order_counts(mut self, order_counts: HashMap<String, u32>) -> Self {
        self.order_counts = order_counts;
        self
    }

    pub fn order_count(&self, product_id: &str) -> u32 {
        self.order_counts.get(product_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(10), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Midday);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Midday);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Evening);
    }

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(1), Some(Season::Winter));
        assert_eq!(Season::from_month(12), Some(Season::Winter));
        assert_eq!(Season::from_month(7), Some(Season::Summer));
        assert_eq!(Season::from_month(4), None);
        assert_eq!(Season::from_month(10), None);
    }

    #[test]
    fn test_time_of_day_serde_lowercase() {
        let json = serde_json::to_string(&TimeOfDay::Midday).unwrap();
        assert_eq!(json, r#""midday""#);
    }
}
