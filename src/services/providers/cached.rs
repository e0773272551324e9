use std::sync::Arc;

use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::AppResult,
    services::{
        providers::{AdvisorClient, AdvisorRequest},
        sources::advisor,
    },
};

/// Read-through Redis cache in front of another advisor.
///
/// Entries are keyed by the request fingerprint, so the same cart on the same
/// menu reuses the stored text until the TTL expires. Failed completions and
/// answers without a usable suggestion block are never cached.
#[derive(Clone)]
pub struct CachedAdvisorClient {
    inner: Arc<dyn AdvisorClient>,
    cache: Cache,
    ttl: u64,
}

impl CachedAdvisorClient {
    pub fn new(inner: Arc<dyn AdvisorClient>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait::async_trait]
impl AdvisorClient for CachedAdvisorClient {
    async fn complete(&self, request: &AdvisorRequest) -> AppResult<String> {
        let key = CacheKey::AdvisorResponse(request.fingerprint());
        tracing::debug!(key = %key, provider = self.inner.name(), "Resolving advisor response");

        cached!(
            self.cache,
            key,
            self.ttl,
            self.inner.complete(request),
            advisor::is_well_formed
        )
    }

    fn name(&self) -> &'static str {
        "cached"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::models::{CartLine, Catalog, CatalogProduct};
    use crate::services::providers::MockAdvisorClient;

    /// In-process stand-in exposing the same read/write surface as `Cache`
    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryCache {
        async fn get_from_cache(&self, key: &CacheKey) -> AppResult<Option<String>> {
            Ok(self.entries.lock().unwrap().get(&key.to_string()).cloned())
        }

        fn set_in_background(&self, key: &CacheKey, value: &str, _ttl: u64) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    fn request() -> AdvisorRequest {
        let catalog = Catalog::new(vec![
            CatalogProduct::new("adana", "Adana Kebap", "Ana Yemek", 320.0),
            CatalogProduct::new("ayran", "Ayran", "İçecek", 40.0),
        ]);
        let cart = vec![CartLine::new(catalog.products()[0].clone(), 1)];
        AdvisorRequest::from_snapshot(&cart, &catalog)
    }

    async fn complete_through(
        cache: &MemoryCache,
        client: &MockAdvisorClient,
        request: &AdvisorRequest,
    ) -> AppResult<String> {
        let key = CacheKey::AdvisorResponse(request.fingerprint());
        cached!(cache, key, 900, client.complete(request), advisor::is_well_formed)
    }

    #[tokio::test]
    async fn test_prose_only_answer_is_not_reused() {
        let mut client = MockAdvisorClient::new();
        client
            .expect_complete()
            .times(2)
            .returning(|_| Ok("I'd suggest an ayran.".to_string()));
        let cache = MemoryCache::default();
        let request = request();

        complete_through(&cache, &client, &request).await.unwrap();
        complete_through(&cache, &client, &request).await.unwrap();
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_usable_answer_is_served_from_cache() {
        let mut client = MockAdvisorClient::new();
        client.expect_complete().times(1).returning(|_| {
            Ok(r#"{"recommendations": [{"name": "Ayran", "compatibility": 90}]}"#.to_string())
        });
        let cache = MemoryCache::default();
        let request = request();

        let first = complete_through(&cache, &client, &request).await.unwrap();
        let second = complete_through(&cache, &client, &request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.entries.lock().unwrap().len(), 1);
    }
}
