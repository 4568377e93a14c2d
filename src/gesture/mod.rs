pub mod pinch;

pub use pinch::{GesturePhase, PinchZoomController, TouchEvent, TouchPoint, TouchResponse, ZoomBounds};
