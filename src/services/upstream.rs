//! upstream.rs
//!
//! Клиент бэкенда площадок: позиции мест, текущая занятость, история загрузки
//! и сохранение новой раскладки. Все сетевые вызовы идут через `CircuitBreaker`.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::config::{CircuitBreakerConfig, UpstreamConfig};
use crate::layout::grid;
use crate::models::{SeatNumber, SeatPosition, SeatSubmission, VenueDraft};
use crate::services::circuit_breaker::CircuitBreaker;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("circuit breaker is open")]
    CircuitOpen,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
}

impl UpstreamError {
    /// Ошибки, которые говорят о недоступности бэкенда (а не о плохом запросе).
    fn is_outage(&self) -> bool {
        match self {
            UpstreamError::CircuitOpen => false,
            UpstreamError::Transport(e) => !e.is_decode(),
            UpstreamError::Status { status, .. } => status.is_server_error(),
        }
    }
}

// --- Формат бэкенда ---

#[derive(Debug, Deserialize)]
struct SeatInfoDto {
    #[serde(rename = "seatsNum")]
    seats_num: SeatNumber,
    x: u32,
    y: u32,
}

#[derive(Debug, Deserialize)]
struct SeatStatusDto {
    #[serde(rename = "seatsNum")]
    seats_num: SeatNumber,
    result: bool,
}

#[derive(Debug, Deserialize)]
struct SeatUsageDto {
    #[serde(rename = "seatNum")]
    seat_num: SeatNumber,
    #[serde(rename = "usedPercent")]
    used_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VenueCreateRequest<'a> {
    name_of_pcroom: &'a str,
    seat_count: i64,
    port: i64,
    width: i64,
    height: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatCreateRequest<'a> {
    name_of_pcroom: &'a str,
    seat_num: SeatNumber,
    seat_ip: &'a str,
    x: u32,
    y: u32,
    pos_x: u32,
    pos_y: u32,
}

/// Несколько записей по одному месту (по дням) усредняются.
fn average_usage(records: Vec<SeatUsageDto>) -> HashMap<SeatNumber, f64> {
    let mut totals: HashMap<SeatNumber, (f64, u32)> = HashMap::new();
    for record in records.into_iter().filter(|r| r.used_percent.is_finite()) {
        let entry = totals.entry(record.seat_num).or_insert((0.0, 0));
        entry.0 += record.used_percent;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(seat, (sum, count))| (seat, sum / f64::from(count)))
        .collect()
}

#[derive(Clone)]
pub struct UpstreamClient {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, breaker: &CircuitBreakerConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(breaker.failure_threshold, breaker.timeout_seconds)),
        })
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// GET /pcrooms/seatInfo/{id}
    pub async fn seat_positions(&self, venue_id: i64) -> Result<Vec<SeatPosition>, UpstreamError> {
        let rows: Vec<SeatInfoDto> = self.get_json(&format!("/pcrooms/seatInfo/{}", venue_id), &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| SeatPosition {
                seat_number: row.seats_num,
                column: row.x,
                row: row.y,
            })
            .collect())
    }

    /// GET /pcrooms/{id}/seat
    pub async fn seat_statuses(&self, venue_id: i64) -> Result<HashMap<SeatNumber, bool>, UpstreamError> {
        let rows: Vec<SeatStatusDto> = self.get_json(&format!("/pcrooms/{}/seat", venue_id), &[]).await?;
        Ok(rows.into_iter().map(|row| (row.seats_num, row.result)).collect())
    }

    /// GET /pcroom/seat-usage-daily/{id}/range-with-info
    pub async fn seat_usage(
        &self,
        venue_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<SeatNumber, f64>, UpstreamError> {
        let query = [
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
        ];
        let rows: Vec<SeatUsageDto> = self
            .get_json(&format!("/pcroom/seat-usage-daily/{}/range-with-info", venue_id), &query)
            .await?;
        Ok(average_usage(rows))
    }

    /// Сохраняет площадку, затем её места. Места отправляются только после успешного
    /// создания площадки.
    pub async fn submit_layout(
        &self,
        venue: &VenueDraft,
        seats: &[SeatSubmission],
        cell_size: u32,
    ) -> Result<(), UpstreamError> {
        let venue_request = VenueCreateRequest {
            name_of_pcroom: venue.name.trim(),
            seat_count: venue.seat_count,
            port: venue.port,
            width: venue.width,
            height: venue.height,
        };
        self.post_json("/pcrooms", &venue_request).await?;

        let seat_requests: Vec<SeatCreateRequest<'_>> = seats
            .iter()
            .map(|seat| {
                let pixel = grid::to_pixel(grid::Cell::new(seat.column, seat.row), cell_size);
                SeatCreateRequest {
                    name_of_pcroom: venue.name.trim(),
                    seat_num: seat.seat_number,
                    seat_ip: &seat.identifier,
                    x: seat.column,
                    y: seat.row,
                    pos_x: pixel.x,
                    pos_y: pixel.y,
                }
            })
            .collect();
        self.post_json("/pcrooms/seats", &seat_requests).await?;

        info!("Layout for '{}' submitted: {} seats", venue.name.trim(), seats.len());
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        self.execute_with_circuit_breaker(async {
            let response = self.http_client.get(&url).query(query).send().await?;
            let response = ensure_success(response).await?;
            Ok(response.json::<T>().await?)
        })
        .await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        self.execute_with_circuit_breaker(async {
            let response = self.http_client.post(&url).json(body).send().await?;
            ensure_success(response).await?;
            Ok(())
        })
        .await
    }

    /// Выполняет операцию, пропуская её через Circuit Breaker.
    async fn execute_with_circuit_breaker<F, T>(&self, operation: F) -> Result<T, UpstreamError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking venue backend request");
            return Err(UpstreamError::CircuitOpen);
        }

        match operation.await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                error!("Venue backend request failed: {}", e);
                if e.is_outage() {
                    self.circuit_breaker.record_failure();
                } else {
                    // бэкенд ответил, просто не тем, чем хотелось
                    self.circuit_breaker.record_success();
                }
                Err(e)
            }
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status { status, body })
}
