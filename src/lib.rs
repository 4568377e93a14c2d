pub mod cache;
pub mod config;
pub mod controllers;
pub mod error;
pub mod gesture;
pub mod layout;
pub mod models;
pub mod occupancy;
pub mod redis_client;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use services::{feed::SeatFeedService, sessions::EditorSessions, upstream::UpstreamClient};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub upstream: UpstreamClient,
    pub feeds: SeatFeedService,
    pub sessions: EditorSessions,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let cache = Self::connect_cache(&config).await;
        Self::with_cache(config, cache)
    }

    /// Состояние с явно заданным кешем (`None` - без кеша).
    pub fn with_cache(config: config::Config, cache: Option<cache::CacheService>) -> anyhow::Result<Arc<Self>> {
        let upstream = UpstreamClient::new(&config.upstream, &config.circuit_breaker)?;
        let feeds = SeatFeedService::new(
            upstream.clone(),
            cache,
            config.layout.viewer_cell_size,
            config.zoom.bounds()?,
        );
        let sessions = EditorSessions::new(config.layout.editor_cell_size);

        Ok(Arc::new(Self {
            config,
            upstream,
            feeds,
            sessions,
        }))
    }

    // Кеш позиций необязателен: без Redis всё работает, просто медленнее
    async fn connect_cache(config: &config::Config) -> Option<cache::CacheService> {
        if !cfg!(feature = "position-cache") || !config.features.enable_position_cache {
            info!("Position cache disabled");
            return None;
        }
        let url = config.redis.url.as_deref()?;
        match redis_client::RedisClient::new(url).await {
            Ok(redis) => Some(cache::CacheService::new(redis, config.redis.positions_ttl_seconds)),
            Err(e) => {
                warn!("Redis unavailable, position cache disabled: {:?}", e);
                None
            }
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seatmap API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
