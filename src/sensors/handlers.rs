use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::source::SensorError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SensorErrorResponse {
    pub error: String,
}

impl IntoResponse for SensorError {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(SensorErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn sensor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/:category", get(get_sensor_data))
        .route(
            "/api/control/:category/:sensor/:value",
            post(control_sensor),
        )
}

#[instrument(skip(state))]
pub async fn get_sensor_data(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Response, SensorError> {
    let readings = state.sensors.readings(&category)?;
    Ok(Json(readings).into_response())
}

#[instrument(skip(state))]
pub async fn control_sensor(
    State(state): State<AppState>,
    Path((category, sensor, value)): Path<(String, String, String)>,
) -> Response {
    let Some(value) = value.parse::<f64>().ok().filter(|v| v.is_finite()) else {
        warn!(%value, "non-numeric sensor value");
        return (
            StatusCode::BAD_REQUEST,
            Json(SensorErrorResponse {
                error: "Invalid sensor value".into(),
            }),
        )
            .into_response();
    };

    match state.sensors.set_reading(&category, &sensor, value) {
        Ok(()) => {
            info!(%category, %sensor, value, "sensor reading overridden");
            Json(MessageResponse {
                message: format!("Sensor {category}/{sensor} data updated successfully."),
            })
            .into_response()
        }
        Err(e) => e.into_response(),
    }
}
