use crate::redis_client::RedisClient;

pub mod positions;

/// Кеш позиций мест. Раскладка меняется только при сохранении новой,
/// поэтому позиции живут в Redis долго.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    positions_ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, positions_ttl_seconds: u64) -> Self {
        Self {
            redis,
            positions_ttl_seconds,
        }
    }
}
