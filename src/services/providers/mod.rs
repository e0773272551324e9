/// Generative-AI advisory provider abstraction
///
/// The recommendation core treats the model as an opaque request/response
/// collaborator: it sends a cart and menu snapshot and gets unstructured text
/// back. Providers are swappable (live HTTP, cached, disabled, test doubles).
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
    error::{AdvisorError, AppResult},
    models::{CartLine, Catalog},
};

pub mod cached;
pub mod http;

pub use cached::CachedAdvisorClient;
pub use http::HttpAdvisorClient;

/// Trait for advisory providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AdvisorClient: Send + Sync {
    /// Sends the snapshot and returns the raw model text
    async fn complete(&self, request: &AdvisorRequest) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Stand-in used when no API key is configured; every pass uses the fallback rules
#[derive(Debug, Clone, Default)]
pub struct DisabledAdvisor;

#[async_trait::async_trait]
impl AdvisorClient for DisabledAdvisor {
    async fn complete(&self, _request: &AdvisorRequest) -> AppResult<String> {
        Err(AdvisorError::Unavailable("advisor not configured".to_string()).into())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CartSnapshotLine {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuEntry {
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuSection {
    pub category: String,
    pub products: Vec<MenuEntry>,
}

/// Structured snapshot sent to the advisor: the cart plus the menu by category
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdvisorRequest {
    pub cart: Vec<CartSnapshotLine>,
    pub menu: Vec<MenuSection>,
}

impl AdvisorRequest {
    pub fn from_snapshot(cart: &[CartLine], catalog: &Catalog) -> Self {
        let cart = cart
            .iter()
            .map(|line| CartSnapshotLine {
                name: line.product.name.clone(),
                category: line.category.clone(),
                price: line.product.price,
                quantity: line.quantity,
            })
            .collect();

        let menu = catalog
            .by_category()
            .into_iter()
            .map(|(category, products)| MenuSection {
                category: category.to_string(),
                products: products
                    .into_iter()
                    .map(|p| MenuEntry {
                        name: p.name.clone(),
                        price: p.price,
                        description: p.description.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self { cart, menu }
    }

    /// SHA-256 over the serialized snapshot; identical carts on an identical
    /// menu share a fingerprint
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        Sha256::digest(&bytes)
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Natural-language instruction wrapping the snapshot
    pub fn prompt(&self) -> String {
        let cart = serde_json::to_string_pretty(&self.cart).unwrap_or_default();
        let menu = serde_json::to_string_pretty(&self.menu).unwrap_or_default();

        format!(
            r#"You are a restaurant ordering assistant. A customer has the following cart:

{cart}

The restaurant menu, grouped by category:

{menu}

Suggest products FROM THIS MENU ONLY that would complete or improve the order.
Consider missing courses (drink, dessert, side), classic pairings and value.

Respond with a single JSON object in exactly this shape:
{{"missingCategories": ["..."],
 "recommendations": [{{"name": "exact menu name", "category": "...", "reason": "...", "price": "...", "compatibility": 0-100, "urgency": "high|medium|low"}}],
 "bundles": [{{"name": "...", "items": ["menu names"], "reason": "..."}}],
 "satisfaction": 0-100,
 "reasoning": "..."}}"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogProduct;

    fn snapshot() -> (Vec<CartLine>, Catalog) {
        let catalog = Catalog::new(vec![
            CatalogProduct::new("p1", "Adana Kebap", "Ana Yemek", 320.0),
            CatalogProduct::new("p2", "Ayran", "İçecek", 40.0).with_description("Köpüklü"),
            CatalogProduct::new("p3", "Urfa Kebap", "Ana Yemek", 310.0),
        ]);
        let cart = vec![CartLine::new(catalog.products()[0].clone(), 2)];
        (cart, catalog)
    }

    #[test]
    fn test_request_groups_menu_by_category() {
        let (cart, catalog) = snapshot();
        let request = AdvisorRequest::from_snapshot(&cart, &catalog);

        assert_eq!(request.cart.len(), 1);
        assert_eq!(request.cart[0].quantity, 2);
        assert_eq!(request.menu.len(), 2);
        assert_eq!(request.menu[0].category, "Ana Yemek");
        assert_eq!(request.menu[0].products.len(), 2);
        assert_eq!(request.menu[1].products[0].description.as_deref(), Some("Köpüklü"));
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let (cart, catalog) = snapshot();
        let a = AdvisorRequest::from_snapshot(&cart, &catalog);
        let b = AdvisorRequest::from_snapshot(&cart, &catalog);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let bigger_cart = vec![CartLine::new(catalog.products()[0].clone(), 3)];
        let c = AdvisorRequest::from_snapshot(&bigger_cart, &catalog);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_prompt_embeds_snapshot() {
        let (cart, catalog) = snapshot();
        let prompt = AdvisorRequest::from_snapshot(&cart, &catalog).prompt();
        assert!(prompt.contains("Adana Kebap"));
        assert!(prompt.contains("Urfa Kebap"));
        assert!(prompt.contains("\"recommendations\""));
    }

    #[tokio::test]
    async fn test_disabled_advisor_is_unavailable() {
        let (cart, catalog) = snapshot();
        let request = AdvisorRequest::from_snapshot(&cart, &catalog);
        let err = DisabledAdvisor.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
