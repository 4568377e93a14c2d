//! seat_maps.rs
//!
//! Карты мест для просмотра:
//! - текущая занятость (занято/свободно);
//! - тепловая карта средней загрузки за диапазон дат.
//!
//! Сбой бэкенда не ломает ответ: без позиций отдаётся пустой кадр, без
//! статусов - кадр со значениями по умолчанию.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::gesture::TouchEvent;
use crate::models::SeatNumber;
use crate::occupancy::{RenderSeat, SeatStatus, SeatUsage, ZoomState};
use crate::services::feed::{GestureOutcome, MapSnapshot};
use crate::AppState;

/// Деления легенды тепловой карты, в процентах.
pub const LEGEND_STOPS: [u8; 5] = [0, 25, 50, 75, 100];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pcrooms/{id}/seat-map", get(get_seat_map))
        .route("/pcrooms/{id}/usage-map", get(get_usage_map))
        .route("/pcrooms/{id}/seat-map/gesture", post(seat_map_gesture))
        .route("/pcrooms/{id}/usage-map/gesture", post(usage_map_gesture))
}

fn ensure_venue_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest("venue id must be > 0".to_string()));
    }
    Ok(())
}

// GET /api/pcrooms/{id}/seat-map
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSeatResponse {
    pub seat_number: SeatNumber,
    pub pixel_x: u32,
    pub pixel_y: u32,
    pub status: SeatStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapResponse<S> {
    pub seats: Vec<S>,
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    pub positions_available: bool,
    pub status_available: bool,
    pub zoom: ZoomState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<[u8; 5]>,
}

fn frame_response<V, S>(
    snapshot: MapSnapshot<V>,
    legend: Option<[u8; 5]>,
    seat: impl Fn(RenderSeat<V>) -> S,
) -> SeatMapResponse<S> {
    let MapSnapshot { frame, zoom } = snapshot;
    SeatMapResponse {
        width: frame.canvas.width,
        height: frame.canvas.height,
        cell_size: frame.cell_size,
        positions_available: frame.positions_available,
        status_available: frame.values_available,
        zoom,
        legend,
        seats: frame.seats.into_iter().map(seat).collect(),
    }
}

async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_venue_id(id)?;

    let snapshot = state.feeds.status_frame(id).await;
    let response = frame_response(snapshot, None, |seat| StatusSeatResponse {
        seat_number: seat.seat_number,
        pixel_x: seat.pixel_x,
        pixel_y: seat.pixel_y,
        status: seat.value,
    });
    Ok(Json(response))
}

// GET /api/pcrooms/{id}/usage-map?startDate=..&endDate=..
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSeatResponse {
    pub seat_number: SeatNumber,
    pub pixel_x: u32,
    pub pixel_y: u32,
    pub used_percent: f64,
    pub intensity: f64,
    pub opacity: f64,
}

fn parse_date(raw: Option<&str>, field: &str, today: NaiveDate) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(today),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("{} must be YYYY-MM-DD, got '{}'", field, value))),
    }
}

/// Диапазон дат из запроса; пропущенные даты - сегодня (UTC).
pub fn date_range(query: &UsageQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = parse_date(query.start_date.as_deref(), "startDate", today)?;
    let end = parse_date(query.end_date.as_deref(), "endDate", today)?;
    if start > end {
        return Err(AppError::BadRequest("startDate must not be after endDate".to_string()));
    }
    Ok((start, end))
}

async fn get_usage_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<UsageQuery>,
) -> Result<impl IntoResponse, AppError> {
    ensure_venue_id(id)?;
    let (start, end) = date_range(&query, Utc::now().date_naive())?;

    let snapshot = state.feeds.usage_frame(id, start, end).await;
    let response = frame_response(snapshot, Some(LEGEND_STOPS), |seat| {
        let SeatUsage { used_percent, intensity } = seat.value;
        UsageSeatResponse {
            seat_number: seat.seat_number,
            pixel_x: seat.pixel_x,
            pixel_y: seat.pixel_y,
            used_percent,
            intensity,
            opacity: seat.value.opacity(),
        }
    });
    Ok(Json(response))
}

// POST /api/pcrooms/{id}/seat-map/gesture, /api/pcrooms/{id}/usage-map/gesture
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureResponse {
    pub consumed: bool,
    pub zoom: ZoomState,
}

impl From<GestureOutcome> for GestureResponse {
    fn from(outcome: GestureOutcome) -> Self {
        Self {
            consumed: outcome.consumed,
            zoom: outcome.zoom,
        }
    }
}

async fn seat_map_gesture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(event): Json<TouchEvent>,
) -> Result<impl IntoResponse, AppError> {
    ensure_venue_id(id)?;
    Ok(Json(GestureResponse::from(state.feeds.status_gesture(id, &event))))
}

async fn usage_map_gesture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(event): Json<TouchEvent>,
) -> Result<impl IntoResponse, AppError> {
    ensure_venue_id(id)?;
    Ok(Json(GestureResponse::from(state.feeds.usage_gesture(id, &event))))
}
