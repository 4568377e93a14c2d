use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::gesture::ZoomBounds;

/// Верхний предел размера ячейки: при нём пиксели любой раскладки редактора
/// (до `MAX_GRID_SIDE` ячеек по оси) помещаются в `u32`.
pub const MAX_CELL_SIZE: u32 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Parse { key: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub upstream: UpstreamConfig,
    pub redis: RedisConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub layout: LayoutConfig,
    pub sessions: SessionConfig,
    pub zoom: ZoomConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Бэкенд площадок, где живут раскладки и статусы мест
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки Redis (кеш позиций). Без URL кеш выключен
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub positions_ttl_seconds: u64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

// Размеры ячеек сетки в пикселях
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub editor_cell_size: u32,
    pub viewer_cell_size: u32,
}

// Сеансы редактора: сколько живёт брошенный сеанс и как часто их чистим
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoomConfig {
    pub min_scale: f64,
    pub max_scale: f64,
}

impl ZoomConfig {
    pub fn bounds(&self) -> Result<ZoomBounds, ConfigError> {
        ZoomBounds::new(self.min_scale, self.max_scale).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_position_cache: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Собирает конфигурацию из произвольного источника переменных (для тестов).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            app: AppConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 8000)?,
                environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                rust_log: lookup("RUST_LOG")
                    .unwrap_or_else(|| "seatmap_service=debug,tower_http=debug".to_string()),
            },
            upstream: UpstreamConfig {
                base_url: lookup("UPSTREAM_API_URL")
                    .unwrap_or_else(|| "http://localhost:8080/api".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds: parse_or(&lookup, "UPSTREAM_TIMEOUT_SECONDS", 30)?,
            },
            redis: RedisConfig {
                url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
                positions_ttl_seconds: parse_or(&lookup, "POSITIONS_CACHE_TTL_SECONDS", 86400)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse_or(&lookup, "CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5)?,
                timeout_seconds: parse_or(&lookup, "CIRCUIT_BREAKER_TIMEOUT_SECONDS", 60)?,
            },
            layout: LayoutConfig {
                editor_cell_size: parse_or(&lookup, "EDITOR_CELL_SIZE", 60)?,
                viewer_cell_size: parse_or(&lookup, "VIEWER_CELL_SIZE", 40)?,
            },
            sessions: SessionConfig {
                ttl_seconds: parse_or(&lookup, "EDITOR_SESSION_TTL_SECONDS", 3600)?,
                sweep_interval_seconds: parse_or(&lookup, "EDITOR_SESSION_SWEEP_SECONDS", 60)?,
            },
            zoom: ZoomConfig {
                min_scale: parse_or(&lookup, "ZOOM_MIN_SCALE", 0.5)?,
                max_scale: parse_or(&lookup, "ZOOM_MAX_SCALE", 3.0)?,
            },
            features: FeatureFlags {
                enable_position_cache: parse_or(&lookup, "ENABLE_POSITION_CACHE", true)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let cell_sizes = [self.layout.editor_cell_size, self.layout.viewer_cell_size];
        if cell_sizes.iter().any(|size| !(1..=MAX_CELL_SIZE).contains(size)) {
            return Err(ConfigError::Invalid(format!("cell sizes must be in 1..={}", MAX_CELL_SIZE)));
        }
        if self.sessions.ttl_seconds == 0 || self.sessions.sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid("session ttl and sweep interval must be > 0".to_string()));
        }
        self.zoom.bounds()?;
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Parse { key, value: raw }),
        None => Ok(default),
    }
}
