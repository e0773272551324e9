pub mod aggregator;
pub mod cart;
pub mod engine;
pub mod extraction;
pub mod providers;
pub mod resolver;
pub mod sources;

pub use aggregator::WeightTable;
pub use cart::{ApplyOutcome, CartEvent, CartEvents, CartIntegrator, CartStore, CartUpdate, InMemoryCartStore};
pub use engine::{RecommendationEngine, RecommendationReport};
