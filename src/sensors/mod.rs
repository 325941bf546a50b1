use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod source;

pub fn router() -> Router<AppState> {
    handlers::sensor_routes()
}
