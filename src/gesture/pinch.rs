//! pinch.rs
//!
//! Масштабирование карты двумя пальцами.
//!
//! Контроллер получает сырые касания от клиента и держит масштаб в заданных
//! границах. У каждой карты свой контроллер, общего состояния жестов нет.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MIN_SCALE: f64 = 0.5;
pub const DEFAULT_MAX_SCALE: f64 = 3.0;

/// Меньшее расстояние считаем "пальцы в одной точке" и никогда не делим на него.
const MIN_TRACKED_DISTANCE: f64 = 1e-6;

/// Активное касание в координатах клиента.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    pub client_x: f64,
    pub client_y: f64,
}

impl TouchPoint {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }

    pub fn distance_to(&self, other: &TouchPoint) -> f64 {
        let dx = self.client_x - other.client_x;
        let dy = self.client_y - other.client_y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Событие касания в том виде, в каком его присылает клиент.
///
/// `touches` - касания, активные после события; для `End` это оставшиеся пальцы.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum TouchEvent {
    Start { touches: Vec<TouchPoint> },
    Move { touches: Vec<TouchPoint> },
    End {
        #[serde(default)]
        touches: Vec<TouchPoint>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid zoom bounds: min {min}, max {max}")]
pub struct InvalidZoomBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomBounds {
    min: f64,
    max: f64,
}

impl ZoomBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, InvalidZoomBounds> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(InvalidZoomBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_SCALE,
            max: DEFAULT_MAX_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GesturePhase {
    Idle,
    Pinching,
}

/// Использовал ли контроллер событие. Проигнорированные события остаются
/// обычной прокрутке.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchResponse {
    Consumed,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PinchZoomController {
    bounds: ZoomBounds,
    scale: f64,
    last_distance: Option<f64>,
}

impl PinchZoomController {
    pub fn new(bounds: ZoomBounds) -> Self {
        Self {
            bounds,
            scale: bounds.clamp(1.0),
            last_distance: None,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    pub fn last_distance(&self) -> Option<f64> {
        self.last_distance
    }

    pub fn phase(&self) -> GesturePhase {
        match self.last_distance {
            Some(_) => GesturePhase::Pinching,
            None => GesturePhase::Idle,
        }
    }

    pub fn handle(&mut self, event: &TouchEvent) -> TouchResponse {
        match event {
            TouchEvent::Start { touches } => self.touch_start(touches),
            TouchEvent::Move { touches } => self.touch_move(touches),
            TouchEvent::End { touches } => self.touch_end(touches),
        }
    }

    /// Два пальца на экране: запоминаем начальное расстояние.
    pub fn touch_start(&mut self, touches: &[TouchPoint]) -> TouchResponse {
        match touches {
            [a, b] => {
                self.last_distance = Some(a.distance_to(b));
                TouchResponse::Consumed
            }
            _ => TouchResponse::Ignored,
        }
    }

    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> TouchResponse {
        let (Some(last), [a, b]) = (self.last_distance, touches) else {
            return TouchResponse::Ignored;
        };
        self.apply_distance(last, a.distance_to(b));
        TouchResponse::Consumed
    }

    /// Вызывается с касаниями, оставшимися после touchend/touchcancel.
    pub fn touch_end(&mut self, remaining: &[TouchPoint]) -> TouchResponse {
        if remaining.len() < 2 && self.last_distance.is_some() {
            // масштаб остаётся базой для следующего жеста
            self.last_distance = None;
            return TouchResponse::Consumed;
        }
        TouchResponse::Ignored
    }

    /// Обратно к 1.0 (в пределах границ) и в Idle.
    pub fn reset(&mut self) {
        self.scale = self.bounds.clamp(1.0);
        self.last_distance = None;
    }

    fn apply_distance(&mut self, last: f64, distance: f64) {
        if last > MIN_TRACKED_DISTANCE && distance.is_finite() {
            self.scale = self.bounds.clamp(self.scale * (distance / last));
        }
        self.last_distance = Some(distance);
    }
}

impl Default for PinchZoomController {
    fn default() -> Self {
        Self::new(ZoomBounds::default())
    }
}
