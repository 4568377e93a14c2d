use redis::AsyncCommands;
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::models::SeatPosition;

fn positions_key(venue_id: i64) -> String {
    format!("seat_positions:{}", venue_id)
}

impl CacheService {
    /// Позиции из кеша. Промах, ошибка Redis и битые данные одинаково дают `None`.
    pub async fn get_positions(&self, venue_id: i64) -> Option<Vec<SeatPosition>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = match conn.get(positions_key(venue_id)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Position cache read failed for venue {}: {:?}", venue_id, e);
                return None;
            }
        };
        let data = data?;
        match serde_json::from_str(&data) {
            Ok(positions) => Some(positions),
            Err(e) => {
                warn!("Dropping corrupt position cache for venue {}: {}", venue_id, e);
                self.invalidate_positions(venue_id).await;
                None
            }
        }
    }

    pub async fn save_positions(&self, venue_id: i64, positions: &[SeatPosition]) {
        let data = match serde_json::to_string(positions) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize positions for venue {}: {}", venue_id, e);
                return;
            }
        };
        let mut conn = self.redis.conn.clone();
        let result: Result<(), redis::RedisError> = conn
            .set_ex(positions_key(venue_id), data, self.positions_ttl_seconds)
            .await;
        if let Err(e) = result {
            warn!("Position cache write failed for venue {}: {:?}", venue_id, e);
        }
    }

    pub async fn invalidate_positions(&self, venue_id: i64) {
        let mut conn = self.redis.conn.clone();
        let result: Result<(), redis::RedisError> = conn.del(positions_key(venue_id)).await;
        match result {
            Ok(()) => info!("Invalidated position cache for venue {}", venue_id),
            Err(e) => warn!("Failed to invalidate position cache for venue {}: {:?}", venue_id, e),
        }
    }
}
