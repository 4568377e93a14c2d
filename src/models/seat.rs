use serde::{Deserialize, Serialize};

use crate::layout::grid::{self, Cell};

/// Номер места, уникальный в пределах одной раскладки.
pub type SeatNumber = u32;

/// Место в редакторе раскладки: ячейка, её пиксельная позиция и сетевой идентификатор.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatDefinition {
    pub seat_number: SeatNumber,
    pub column: u32,
    pub row: u32,
    pub pixel_x: u32,
    pub pixel_y: u32,
    /// Пустая строка означает "не назначен".
    pub identifier: String,
}

impl SeatDefinition {
    pub fn placed(seat_number: SeatNumber, cell: Cell, cell_size: u32) -> Self {
        let pixel = grid::to_pixel(cell, cell_size);
        Self {
            seat_number,
            column: cell.column,
            row: cell.row,
            pixel_x: pixel.x,
            pixel_y: pixel.y,
            identifier: String::new(),
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.column, self.row)
    }

    pub(crate) fn move_to(&mut self, cell: Cell, cell_size: u32) {
        let pixel = grid::to_pixel(cell, cell_size);
        self.column = cell.column;
        self.row = cell.row;
        self.pixel_x = pixel.x;
        self.pixel_y = pixel.y;
    }

    pub fn to_submission(&self) -> SeatSubmission {
        SeatSubmission {
            seat_number: self.seat_number,
            column: self.column,
            row: self.row,
            identifier: self.identifier.clone(),
        }
    }
}

/// Позиция места из фида раскладки (то, что хранит бэкенд).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatPosition {
    pub seat_number: SeatNumber,
    pub column: u32,
    pub row: u32,
}

impl SeatPosition {
    pub fn cell(&self) -> Cell {
        Cell::new(self.column, self.row)
    }
}

/// Запись, которая уходит во внешний create/update при сохранении раскладки.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSubmission {
    pub seat_number: SeatNumber,
    pub column: u32,
    pub row: u32,
    pub identifier: String,
}
