//! view.rs
//!
//! Модель представления одной карты занятости.
//!
//! Владеет данными экрана целиком: последним фидом позиций, последним фидом
//! значений и контроллером масштаба. Каждый запрос данных помечается поколением,
//! ответы старших поколений отбрасываются при получении, поэтому медленный
//! ответ на старый диапазон дат не может затереть свежие данные.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::{debug, warn};

use crate::gesture::{GesturePhase, PinchZoomController, ZoomBounds};
use crate::models::{SeatNumber, SeatPosition};
use crate::occupancy::join::{join_by_seat, CanvasSize};
use crate::occupancy::renderer::RenderFrame;

/// Номер поколения запроса.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Результат применения ответа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    /// Ответ пришёл на устаревший запрос и был отброшен.
    Stale,
}

/// Масштаб карты в том виде, в каком он уходит клиенту.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomState {
    pub scale: f64,
    pub phase: GesturePhase,
    pub scaled_width: f64,
    pub scaled_height: f64,
}

#[derive(Debug, Clone)]
enum Feed<T> {
    Pending,
    Ready(T),
    Failed,
}

impl<T> Feed<T> {
    fn ready(&self) -> Option<&T> {
        match self {
            Feed::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OccupancyView<V> {
    cell_size: u32,
    generation: u64,
    positions: Feed<Vec<SeatPosition>>,
    values: Feed<HashMap<SeatNumber, V>>,
    zoom: PinchZoomController,
}

impl<V: Clone + Default> OccupancyView<V> {
    pub fn new(cell_size: u32, bounds: ZoomBounds) -> Self {
        Self {
            cell_size,
            generation: 0,
            positions: Feed::Pending,
            values: Feed::Pending,
            zoom: PinchZoomController::new(bounds),
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.generation)
    }

    /// Начинает новое поколение (смена площадки, диапазона дат, ручное обновление).
    ///
    /// Значения старого поколения сбрасываются в "ожидание", позиции остаются до
    /// прихода новых: раскладка меняется редко, а мигание пустой картой хуже.
    pub fn begin_refresh(&mut self) -> Generation {
        self.generation += 1;
        self.values = Feed::Pending;
        Generation(self.generation)
    }

    pub fn apply_positions<E: Display>(
        &mut self,
        generation: Generation,
        result: Result<Vec<SeatPosition>, E>,
    ) -> Applied {
        if !self.is_current(generation) {
            debug!("discarding stale positions of generation {}", generation.0);
            return Applied::Stale;
        }
        self.positions = match result {
            Ok(positions) => Feed::Ready(positions),
            Err(e) => {
                warn!("seat positions unavailable: {}", e);
                Feed::Failed
            }
        };
        Applied::Accepted
    }

    pub fn apply_values<E: Display>(
        &mut self,
        generation: Generation,
        result: Result<HashMap<SeatNumber, V>, E>,
    ) -> Applied {
        if !self.is_current(generation) {
            debug!("discarding stale seat values of generation {}", generation.0);
            return Applied::Stale;
        }
        self.values = match result {
            Ok(values) => Feed::Ready(values),
            Err(e) => {
                warn!("seat values unavailable, rendering defaults: {}", e);
                Feed::Failed
            }
        };
        Applied::Accepted
    }

    /// Собирает кадр из того, что уже пришло. Отсутствующие значения дают значения по умолчанию.
    pub fn frame(&self) -> RenderFrame<V> {
        let Some(positions) = self.positions.ready() else {
            return RenderFrame::empty(self.cell_size);
        };
        let seats = match self.values.ready() {
            Some(values) => join_by_seat(positions, values, self.cell_size),
            None => join_by_seat(positions, &HashMap::new(), self.cell_size),
        };
        let mut frame = RenderFrame::new(seats, self.cell_size);
        frame.values_available = self.values.ready().is_some();
        frame
    }

    pub fn zoom(&self) -> &PinchZoomController {
        &self.zoom
    }

    pub fn zoom_mut(&mut self) -> &mut PinchZoomController {
        &mut self.zoom
    }

    /// Размер холста с учётом текущего масштаба.
    pub fn scaled_canvas(&self) -> (f64, f64) {
        let CanvasSize { width, height } = self.frame().canvas;
        let scale = self.zoom.scale();
        (f64::from(width) * scale, f64::from(height) * scale)
    }

    pub fn zoom_state(&self) -> ZoomState {
        let (scaled_width, scaled_height) = self.scaled_canvas();
        ZoomState {
            scale: self.zoom.scale(),
            phase: self.zoom.phase(),
            scaled_width,
            scaled_height,
        }
    }

    fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.generation
    }
}
