pub mod seat;
pub mod venue;

pub use seat::{SeatDefinition, SeatNumber, SeatPosition, SeatSubmission};
pub use venue::VenueDraft;
