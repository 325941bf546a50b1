use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            DashboardResponse, ErrorResponse, LoginRequest, LoginResponse, RegisterRequest,
            RegisterResponse,
        },
        error::AuthError,
        extractors::BasicUser,
        services,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/adduser", post(add_user))
        .route("/api/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/:id", get(get_user))
        .route("/api/dashboard", get(dashboard))
}

#[instrument(skip(state, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let RegisterRequest {
        password,
        email,
        first_name,
        last_name,
    } = payload;
    let store = state.users.as_ref();
    let user = services::register(store, password, email, first_name, last_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        warn!("login without email or password");
        return Err(AuthError::InvalidCredentials);
    };

    services::login(state.users.as_ref(), &email, &password)
        .await?;
    Ok(Json(LoginResponse { success: true }))
}

/// A missing user answers 400, matching what existing clients already handle.
#[instrument(skip(state))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match services::find_user(state.users.as_ref(), id).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => {
            warn!(user_id = id, "user not found");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    success: false,
                    error: "User not found".into(),
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[instrument(skip_all)]
pub async fn dashboard(BasicUser(user): BasicUser) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        data: format!("Hello, {}!", user.first_name),
    })
}
