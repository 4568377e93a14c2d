pub mod layouts;
pub mod seat_maps;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seat_maps::routes())
        .nest("/layouts", layouts::routes())
}
