//! Авторская часть: геометрия сетки и редактор раскладки мест.

pub mod editor;
pub mod grid;

pub use editor::{DragRejected, GenerationOutcome, IdentifierPrompt, PromptError, SeatLayoutEditor};
pub use grid::{Cell, PixelPoint};
