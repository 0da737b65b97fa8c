use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde::Deserialize;

use crate::{
    adapters::http::{
        app_state::AppState,
        routes::auth::{GymResponse, session_headers},
    },
    app_error::AppResult,
};

#[derive(Deserialize)]
struct RegisterPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

/// Create a gym account and sign it in.
async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<(StatusCode, HeaderMap, Json<GymResponse>)> {
    let gym = app_state
        .gym_use_cases
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    let headers = session_headers(&app_state, &gym)?;
    Ok((StatusCode::CREATED, headers, Json(gym.into())))
}
