use serde::Serialize;
use std::collections::HashMap;

use crate::layout::grid::{self, PixelPoint};
use crate::models::{SeatNumber, SeatPosition};

/// Место, готовое к отрисовке: пиксельная позиция плюс значение из второго фида.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSeat<V> {
    pub seat_number: SeatNumber,
    pub pixel_x: u32,
    pub pixel_y: u32,
    pub value: V,
}

impl<V> RenderSeat<V> {
    pub fn map_value<U>(self, f: impl FnOnce(V) -> U) -> RenderSeat<U> {
        RenderSeat {
            seat_number: self.seat_number,
            pixel_x: self.pixel_x,
            pixel_y: self.pixel_y,
            value: f(self.value),
        }
    }
}

/// Соединяет фид позиций (главный) с фидом значений по номеру места.
///
/// Порядок результата всегда совпадает с порядком `positions`. Места, которых нет
/// в фиде значений, получают `V::default()`; лишние записи фида игнорируются.
pub fn join_by_seat<V: Clone + Default>(
    positions: &[SeatPosition],
    values: &HashMap<SeatNumber, V>,
    cell_size: u32,
) -> Vec<RenderSeat<V>> {
    positions
        .iter()
        .map(|position| {
            let PixelPoint { x, y } = grid::to_pixel(position.cell(), cell_size);
            RenderSeat {
                seat_number: position.seat_number,
                pixel_x: x,
                pixel_y: y,
                value: values.get(&position.seat_number).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Размер холста: крайняя позиция плюс одна ячейка, ноль для пустого списка.
pub fn canvas_size<V>(seats: &[RenderSeat<V>], cell_size: u32) -> CanvasSize {
    let max_x = seats.iter().map(|s| s.pixel_x).max();
    let max_y = seats.iter().map(|s| s.pixel_y).max();
    match (max_x, max_y) {
        (Some(x), Some(y)) => CanvasSize {
            width: x.saturating_add(cell_size),
            height: y.saturating_add(cell_size),
        },
        _ => CanvasSize::default(),
    }
}
