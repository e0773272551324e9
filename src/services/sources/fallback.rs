use crate::models::{CartLine, CatalogProduct, RawRecommendation, SourceCategory, Urgency};

use super::{contains_any, SignalInput};

const MAIN_DISH_KEYWORDS: &[&str] = &[
    "main", "ana yemek", "kebap", "kebab", "döner", "pide", "lahmacun", "köfte", "pizza",
    "burger", "ızgara", "izgara", "grill", "yemek",
];

const DRINK_KEYWORDS: &[&str] = &[
    "drink", "içecek", "i\u{307}çecek", "beverage", "ayran", "cola", "kola", "şalgam", "limonata",
    "lemonade", "juice", "meyve suyu", "soda", "çay", "kahve", "coffee",
];

const DESSERT_KEYWORDS: &[&str] = &[
    "dessert", "tatlı", "baklava", "künefe", "kadayıf", "sütlaç", "dondurma", "ice cream",
    "cake",
];

const DRINK_SCORE: f64 = 85.0;
const DESSERT_SCORE: f64 = 80.0;

/// Coarse meal-course classification of a cart line or product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealCourse {
    MainDish,
    Drink,
    Dessert,
    Other,
}

impl MealCourse {
    /// Classifies by keyword containment; dessert and drink are checked first
    /// so "Tatlı" or "Sıcak İçecek" never read as a main dish
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        if contains_any(&text, DESSERT_KEYWORDS) {
            MealCourse::Dessert
        } else if contains_any(&text, DRINK_KEYWORDS) {
            MealCourse::Drink
        } else if contains_any(&text, MAIN_DISH_KEYWORDS) {
            MealCourse::MainDish
        } else {
            MealCourse::Other
        }
    }
}

/// Deterministic missing-course heuristic, used only when the AI advisor
/// produced nothing usable
#[derive(Debug, Clone, Default)]
pub struct FallbackRuleEngine;

impl FallbackRuleEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn recommend(&self, input: &SignalInput<'_>) -> Vec<RawRecommendation> {
        let courses: Vec<MealCourse> = input.cart.iter().map(course_of).collect();

        if !courses.contains(&MealCourse::MainDish) {
            return Vec::new();
        }

        let mut recommendations = Vec::new();

        if !courses.contains(&MealCourse::Drink) {
            if let Some(drink) = first_of_course(input, MealCourse::Drink) {
                recommendations.push(
                    RawRecommendation::new(
                        drink.id.clone(),
                        SourceCategory::AiPowered,
                        DRINK_SCORE,
                        "Completes a main-dish order",
                    )
                    .with_urgency(Urgency::High)
                    .with_confidence(DRINK_SCORE / 100.0),
                );
            }
        }

        if !courses.contains(&MealCourse::Dessert) {
            if let Some(dessert) = first_of_course(input, MealCourse::Dessert) {
                recommendations.push(
                    RawRecommendation::new(
                        dessert.id.clone(),
                        SourceCategory::AiPowered,
                        DESSERT_SCORE,
                        "A dessert rounds off a main-dish order",
                    )
                    .with_urgency(Urgency::Medium)
                    .with_confidence(DESSERT_SCORE / 100.0),
                );
            }
        }

        recommendations
    }
}

/// A line counts by its category, falling back to its name when the category says nothing
fn course_of(line: &CartLine) -> MealCourse {
    match MealCourse::classify(&line.category) {
        MealCourse::Other => MealCourse::classify(line.name()),
        course => course,
    }
}

fn first_of_course<'a>(input: &SignalInput<'a>, course: MealCourse) -> Option<&'a CatalogProduct> {
    input
        .candidates()
        .find(|p| MealCourse::classify(&p.category) == course)
        .or_else(|| {
            input
                .candidates()
                .find(|p| MealCourse::classify(&p.name) == course)
        })
}
