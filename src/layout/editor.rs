//! editor.rs
//!
//! Редактор раскладки мест.
//!
//! Оператор вводит количество мест, колонок и рядов, редактор раскладывает места
//! построчно, дальше места перетаскиваются с привязкой к сетке и получают сетевые
//! идентификаторы. Все "ожидаемые" исходы взаимодействия (занятая ячейка, усечённая
//! генерация, пустая форма) возвращаются значениями, а не ошибками.

use serde::Serialize;
use std::collections::HashSet;
use std::net::IpAddr;
use thiserror::Error;
use tracing::debug;

use crate::layout::grid::{self, Cell};
use crate::models::{SeatDefinition, SeatNumber, SeatSubmission};

/// Предел сетки по каждой оси.
///
/// Вместе с ограничением размера ячейки в конфиге гарантирует, что пиксельные
/// координаты любой сгенерированной раскладки помещаются в `u32`.
pub const MAX_GRID_SIDE: u32 = 500;

/// Предел количества мест в одной раскладке.
pub const MAX_SEATS: u32 = 10_000;

/// Раскладывает места построчно: ряд 1 слева направо, затем ряд 2 и т.д.
///
/// Останавливается, как только размещено `total_seats` мест или закончилась сетка.
/// Неположительные значения и значения сверх `MAX_SEATS`/`MAX_GRID_SIDE` дают пустую
/// раскладку, а не ошибку: для формы это такое же некорректное значение, как ноль.
/// Вызывающий сам сверяет количество с запрошенным.
pub fn generate_layout(total_seats: i64, columns: i64, rows: i64, cell_size: u32) -> Vec<SeatDefinition> {
    let (Some(total), Some(columns), Some(rows)) = (
        bounded(total_seats, MAX_SEATS),
        bounded(columns, MAX_GRID_SIDE),
        bounded(rows, MAX_GRID_SIDE),
    ) else {
        debug!(
            "layout {}x{} for {} seats is out of range, nothing generated",
            columns, rows, total_seats
        );
        return Vec::new();
    };

    let placed = total.min(columns * rows) as usize;
    let mut seats = Vec::with_capacity(placed);
    // занятые ячейки: та же проверка, что и при перетаскивании, но за O(1)
    let mut occupied: HashSet<Cell> = HashSet::with_capacity(placed);
    let mut next_number: SeatNumber = 1;

    'fill: for row in 1..=rows {
        for column in 1..=columns {
            if next_number > total {
                break 'fill;
            }
            let cell = Cell::new(column, row);
            if !occupied.insert(cell) {
                continue;
            }
            seats.push(SeatDefinition::placed(next_number, cell, cell_size));
            next_number += 1;
        }
    }
    seats
}

fn bounded(value: i64, max: u32) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| (1..=max).contains(v))
}

/// Итог генерации: сколько мест запросили и сколько поместилось.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub requested: u32,
    pub placed: u32,
}

impl GenerationOutcome {
    pub fn is_truncated(&self) -> bool {
        self.placed < self.requested
    }
}

/// Почему перенос места отклонён. Позиция места при этом не меняется.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum DragRejected {
    #[error("cell ({}, {}) is already occupied", .cell.column, .cell.row)]
    #[serde(rename_all = "camelCase")]
    Occupied { seat_number: SeatNumber, cell: Cell },
    #[error("seat {seat_number} does not exist")]
    #[serde(rename_all = "camelCase")]
    UnknownSeat { seat_number: SeatNumber },
    #[error("cell ({}, {}) is outside the {}x{} grid", .cell.column, .cell.row, MAX_GRID_SIDE, MAX_GRID_SIDE)]
    #[serde(rename_all = "camelCase")]
    OutOfBounds { seat_number: SeatNumber, cell: Cell },
    #[error("identifier prompt is open")]
    PromptOpen,
}

/// Привязывает отпущенное место к ближайшей ячейке и переносит его, если ячейка свободна.
pub fn end_drag(
    seat_number: SeatNumber,
    raw_x: f64,
    raw_y: f64,
    cell_size: u32,
    seats: &mut [SeatDefinition],
) -> Result<SeatDefinition, DragRejected> {
    let index = seats
        .iter()
        .position(|seat| seat.seat_number == seat_number)
        .ok_or(DragRejected::UnknownSeat { seat_number })?;

    let cell = grid::to_cell(raw_x, raw_y, cell_size);
    if cell.column > MAX_GRID_SIDE || cell.row > MAX_GRID_SIDE {
        debug!("drag of seat {} rejected: ({}, {}) out of bounds", seat_number, cell.column, cell.row);
        return Err(DragRejected::OutOfBounds { seat_number, cell });
    }
    if grid::collides(cell, seat_number, seats) {
        debug!("drag of seat {} rejected: ({}, {}) occupied", seat_number, cell.column, cell.row);
        return Err(DragRejected::Occupied { seat_number, cell });
    }

    let seat = &mut seats[index];
    seat.move_to(cell, cell_size);
    Ok(seat.clone())
}

pub fn to_submission(seats: &[SeatDefinition]) -> Vec<SeatSubmission> {
    seats.iter().map(SeatDefinition::to_submission).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("seat {0} does not exist")]
pub struct UnknownSeat(pub SeatNumber);

/// Открытый диалог ввода идентификатора.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierPrompt {
    pub seat_number: SeatNumber,
    /// Текущее значение места, им заполняется поле ввода.
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("no identifier prompt is open")]
    NotOpen,
    #[error("identifier prompt is already open for seat {0}")]
    AlreadyOpen(SeatNumber),
    #[error(transparent)]
    UnknownSeat(#[from] UnknownSeat),
    #[error("'{0}' is not a valid IP address")]
    InvalidIdentifier(String),
}

/// Пустое значение означает "не назначен", иначе ждём IPv4/IPv6 адрес.
pub fn normalize_identifier(value: &str) -> Result<String, PromptError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    trimmed
        .parse::<IpAddr>()
        .map(|_| trimmed.to_string())
        .map_err(|_| PromptError::InvalidIdentifier(trimmed.to_string()))
}

/// Состояние одного сеанса редактирования раскладки.
#[derive(Debug, Clone)]
pub struct SeatLayoutEditor {
    cell_size: u32,
    seats: Vec<SeatDefinition>,
    dragging: Option<SeatNumber>,
    prompt: Option<IdentifierPrompt>,
}

impl SeatLayoutEditor {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size,
            seats: Vec::new(),
            dragging: None,
            prompt: None,
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn seats(&self) -> &[SeatDefinition] {
        &self.seats
    }

    pub fn dragging(&self) -> Option<SeatNumber> {
        self.dragging
    }

    pub fn prompt(&self) -> Option<&IdentifierPrompt> {
        self.prompt.as_ref()
    }

    /// Генерирует раскладку заново, старые места и открытый диалог отбрасываются.
    pub fn generate(&mut self, total_seats: i64, columns: i64, rows: i64) -> GenerationOutcome {
        self.seats = generate_layout(total_seats, columns, rows, self.cell_size);
        self.dragging = None;
        self.prompt = None;

        let outcome = GenerationOutcome {
            requested: u32::try_from(total_seats.max(0)).unwrap_or(u32::MAX),
            placed: self.seats.len() as u32,
        };
        if outcome.is_truncated() {
            debug!(
                "layout truncated: {} of {} seats fit into {}x{}",
                outcome.placed, outcome.requested, columns, rows
            );
        }
        outcome
    }

    pub fn reset(&mut self) {
        self.seats.clear();
        self.dragging = None;
        self.prompt = None;
    }

    pub fn begin_drag(&mut self, seat_number: SeatNumber) -> Result<(), DragRejected> {
        if self.prompt.is_some() {
            return Err(DragRejected::PromptOpen);
        }
        if !self.contains(seat_number) {
            return Err(DragRejected::UnknownSeat { seat_number });
        }
        self.dragging = Some(seat_number);
        Ok(())
    }

    pub fn end_drag(&mut self, seat_number: SeatNumber, raw_x: f64, raw_y: f64) -> Result<SeatDefinition, DragRejected> {
        if self.prompt.is_some() {
            return Err(DragRejected::PromptOpen);
        }
        if self.dragging == Some(seat_number) {
            self.dragging = None;
        }
        end_drag(seat_number, raw_x, raw_y, self.cell_size, &mut self.seats)
    }

    /// Прямое назначение без проверки формата, пустая строка допустима.
    pub fn assign_identifier(&mut self, seat_number: SeatNumber, identifier: impl Into<String>) -> Result<(), UnknownSeat> {
        let seat = self
            .seats
            .iter_mut()
            .find(|seat| seat.seat_number == seat_number)
            .ok_or(UnknownSeat(seat_number))?;
        seat.identifier = identifier.into();
        Ok(())
    }

    pub fn open_identifier_prompt(&mut self, seat_number: SeatNumber) -> Result<&IdentifierPrompt, PromptError> {
        if let Some(open) = &self.prompt {
            return Err(PromptError::AlreadyOpen(open.seat_number));
        }
        let current = self
            .seats
            .iter()
            .find(|seat| seat.seat_number == seat_number)
            .map(|seat| seat.identifier.clone())
            .ok_or(UnknownSeat(seat_number))?;
        self.dragging = None;
        let prompt = self.prompt.insert(IdentifierPrompt { seat_number, current });
        Ok(&*prompt)
    }

    /// Применяет значение из диалога. При невалидном значении диалог остаётся открытым.
    pub fn confirm_identifier(&mut self, value: &str) -> Result<SeatDefinition, PromptError> {
        let seat_number = self.prompt.as_ref().ok_or(PromptError::NotOpen)?.seat_number;
        let identifier = normalize_identifier(value)?;

        self.prompt = None;
        let seat = self
            .seats
            .iter_mut()
            .find(|seat| seat.seat_number == seat_number)
            .ok_or(UnknownSeat(seat_number))?;
        seat.identifier = identifier;
        Ok(seat.clone())
    }

    pub fn cancel_identifier_prompt(&mut self) -> Option<IdentifierPrompt> {
        self.prompt.take()
    }

    pub fn to_submission(&self) -> Vec<SeatSubmission> {
        to_submission(&self.seats)
    }

    fn contains(&self, seat_number: SeatNumber) -> bool {
        self.seats.iter().any(|seat| seat.seat_number == seat_number)
    }
}
