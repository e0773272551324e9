/// Read-through caching over [`Cache`](crate::cache::Cache).
///
/// Returns the cached value on a hit. On a miss the block is awaited, its
/// `Ok` value queued for a background write, and returned. A failed cache
/// read is logged and treated as a miss, so an unreachable Redis only costs
/// the live call. Errors from the block itself are propagated with `?`.
///
/// # Arguments
/// * `$cache`: the cache instance (`get_from_cache` / `set_in_background`).
/// * `$key`: the `CacheKey`, evaluated once.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: future computing the value on a miss.
/// * `$keep` (optional): predicate on the fresh value; `false` skips the write.
///
/// # Example
/// ```rust,ignore
/// let text: String = cached!(cache, CacheKey::AdvisorResponse(fp), 900, async move {
///     client.complete(&request).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {
        $crate::cached!($cache, $key, $ttl, $block, |_| true)
    };
    ($cache:expr, $key:expr, $ttl:expr, $block:expr, $keep:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, computing fresh value");
                }
                let value = $block.await?;
                if ($keep)(&value) {
                    $cache.set_in_background(&key, &value, $ttl);
                } else {
                    tracing::debug!(key = %key, "Fresh value rejected for caching");
                }
                Ok(value)
            }
        }
    }};
}
