use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sofra_advisor::{
    api::{create_router, AppState},
    cache::{Cache, CacheWriterHandle},
    config::Config,
    services::providers::{AdvisorClient, CachedAdvisorClient, DisabledAdvisor, HttpAdvisorClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let (advisor, cache_writer) = build_advisor(&config).await?;

    let state = AppState::new(advisor, &config).context("Invalid recommendation settings")?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// Live advisor when a key is configured, wrapped in the Redis cache when a
/// URL is configured; the disabled advisor otherwise
async fn build_advisor(
    config: &Config,
) -> anyhow::Result<(Arc<dyn AdvisorClient>, Option<CacheWriterHandle>)> {
    let Some(api_key) = config.advisor_api_key.clone() else {
        tracing::warn!("ADVISOR_API_KEY not set, every pass will use the fallback rules");
        return Ok((Arc::new(DisabledAdvisor), None));
    };

    let http: Arc<dyn AdvisorClient> = Arc::new(
        HttpAdvisorClient::new(
            api_key,
            config.advisor_api_url.clone(),
            config.advisor_model.clone(),
            config.advisor_max_tokens,
            config.advisor_timeout(),
        )
        .context("Failed to build advisor HTTP client")?,
    );

    let Some(redis_url) = config.redis_url.as_deref() else {
        return Ok((http, None));
    };

    match Cache::connect(redis_url).await {
        Ok((cache, writer)) => {
            let cached = CachedAdvisorClient::new(http, cache, config.advisor_cache_ttl_secs);
            Ok((Arc::new(cached), Some(writer)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, advisor responses will not be cached");
            Ok((http, None))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
