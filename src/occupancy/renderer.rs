//! renderer.rs
//!
//! Статусная карта и тепловая карта загрузки поверх общего соединения фидов.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{SeatNumber, SeatPosition};
use crate::occupancy::join::{canvas_size, join_by_seat, CanvasSize, RenderSeat};

/// Минимальная непрозрачность: место с нулевой загрузкой всё равно должно быть видно.
pub const MIN_OPACITY: f64 = 0.1;
pub const MAX_OPACITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeatStatus {
    Occupied,
    #[default]
    Available,
}

impl From<bool> for SeatStatus {
    fn from(occupied: bool) -> Self {
        if occupied {
            SeatStatus::Occupied
        } else {
            SeatStatus::Available
        }
    }
}

pub fn merge_positions_with_status(
    positions: &[SeatPosition],
    statuses: &HashMap<SeatNumber, bool>,
    cell_size: u32,
) -> Vec<RenderSeat<SeatStatus>> {
    join_by_seat(positions, statuses, cell_size)
        .into_iter()
        .map(|seat| seat.map_value(SeatStatus::from))
        .collect()
}

/// Загрузка места: процент из фида и нормированная интенсивность в [0, 1].
/// Место без данных - нулевая загрузка.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatUsage {
    pub used_percent: f64,
    pub intensity: f64,
}

impl SeatUsage {
    pub fn opacity(&self) -> f64 {
        usage_to_opacity(self.used_percent)
    }
}

impl From<f64> for SeatUsage {
    fn from(percent: f64) -> Self {
        Self {
            used_percent: percent,
            intensity: usage_intensity(percent),
        }
    }
}

pub fn merge_positions_with_usage(
    positions: &[SeatPosition],
    usage: &HashMap<SeatNumber, f64>,
    cell_size: u32,
) -> Vec<RenderSeat<SeatUsage>> {
    join_by_seat(positions, usage, cell_size)
        .into_iter()
        .map(|seat| seat.map_value(SeatUsage::from))
        .collect()
}

/// `clamp(percent / 100, 0.1, 1.0)`.
pub fn usage_to_opacity(percent: f64) -> f64 {
    if percent.is_nan() {
        return MIN_OPACITY;
    }
    (percent / 100.0).clamp(MIN_OPACITY, MAX_OPACITY)
}

/// Нормированная загрузка в [0, 1].
pub fn usage_intensity(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Один кадр карты. Пересчитывается на каждое изменение фидов, не кешируется.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame<V> {
    pub seats: Vec<RenderSeat<V>>,
    #[serde(flatten)]
    pub canvas: CanvasSize,
    pub cell_size: u32,
    pub positions_available: bool,
    pub values_available: bool,
}

impl<V> RenderFrame<V> {
    pub fn new(seats: Vec<RenderSeat<V>>, cell_size: u32) -> Self {
        let canvas = canvas_size(&seats, cell_size);
        Self {
            seats,
            canvas,
            cell_size,
            positions_available: true,
            values_available: true,
        }
    }

    /// Кадр "нет данных": ноль мест, нулевой холст.
    pub fn empty(cell_size: u32) -> Self {
        Self {
            seats: Vec::new(),
            canvas: CanvasSize::default(),
            cell_size,
            positions_available: false,
            values_available: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}
