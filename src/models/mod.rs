mod cart;
mod catalog;
mod context;
mod recommendation;

pub use cart::{contains_product, CartLine};
pub use catalog::{Catalog, CatalogProduct};
pub use context::{RecommendationContext, Season, TimeOfDay};
pub use recommendation::{AggregatedRecommendation, RawRecommendation, SourceCategory, Urgency};
