//! grid.rs
//!
//! Преобразование между ячейками сетки (column, row) и пиксельными координатами.
//! Редактор раскладки пишет через эти функции, карта занятости читает через них же,
//! поэтому обе стороны всегда видят одну и ту же геометрию.

use serde::{Deserialize, Serialize};

use crate::models::{SeatDefinition, SeatNumber};

/// Ячейка сетки. Нумерация с 1 по обеим осям.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub column: u32,
    pub row: u32,
}

impl Cell {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Левый верхний угол ячейки в пикселях.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

/// `x = (column - 1) * cell_size`, `y = (row - 1) * cell_size`.
///
/// Переполнение насыщается на `u32::MAX`, и для таких ячеек обратное
/// преобразование уже не точное. Раскладки редактора до этого не доходят:
/// сетка ограничена `MAX_GRID_SIDE`, размер ячейки - `MAX_CELL_SIZE`. Насыщение
/// возможно только для позиций, пришедших с бэкенда.
pub fn to_pixel(cell: Cell, cell_size: u32) -> PixelPoint {
    PixelPoint {
        x: cell.column.saturating_sub(1).saturating_mul(cell_size),
        y: cell.row.saturating_sub(1).saturating_mul(cell_size),
    }
}

/// Привязка к ближайшей ячейке: `round(x / cell_size) + 1`.
///
/// Отрицательные, нечисловые и слишком маленькие значения прижимаются к первой
/// ячейке, так что результат всегда валиден. `cell_size == 0` тоже даёт (1, 1).
pub fn to_cell(x: f64, y: f64, cell_size: u32) -> Cell {
    Cell {
        column: snap_axis(x, cell_size),
        row: snap_axis(y, cell_size),
    }
}

fn snap_axis(raw: f64, cell_size: u32) -> u32 {
    if cell_size == 0 {
        return 1;
    }
    let index = (raw / f64::from(cell_size)).round();
    if index.is_finite() && index > 0.0 {
        // `as` насыщается на u32::MAX
        (index as u32).saturating_add(1)
    } else {
        1
    }
}

/// true, если ячейку занимает какое-то *другое* место (не `moving`).
pub fn collides(candidate: Cell, moving: SeatNumber, seats: &[SeatDefinition]) -> bool {
    seats
        .iter()
        .any(|seat| seat.seat_number != moving && seat.cell() == candidate)
}
