//! Карта занятости: соединение фида позиций с фидом статусов/загрузки и
//! модель представления, которая владеет данными одного экрана.

pub mod join;
pub mod renderer;
pub mod view;

pub use join::{canvas_size, join_by_seat, CanvasSize, RenderSeat};
pub use renderer::{
    merge_positions_with_status, merge_positions_with_usage, usage_to_opacity, RenderFrame,
    SeatStatus, SeatUsage,
};
pub use view::{Applied, Generation, OccupancyView, ZoomState};
