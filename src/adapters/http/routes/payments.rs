use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, routes::auth::current_gym},
    app_error::{AppError, AppResult},
    domain::entities::payment::Payment,
    use_cases::payment::{PaymentInput, PaymentQuote},
};

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams {
    client_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(history).post(record_payment))
        .route("/quote", post(quote))
}

async fn history(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<Vec<Payment>>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let client_id = params
        .client_id
        .ok_or_else(|| AppError::InvalidInput("clientId is required".into()))?;
    let payments = app_state
        .payment_use_cases
        .history(gym_id, client_id)
        .await?;
    Ok(Json(payments))
}

/// 201 for a new payment, 200 when an earlier submission is replayed.
async fn record_payment(
    State(app_state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(mut input): Json<PaymentInput>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let gym_id = current_gym(&jar, &app_state)?;
    if let Some(key) = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.trim().is_empty())
    {
        input.idempotency_key = Some(key.to_string());
    }

    let recorded = app_state.payment_use_cases.record(gym_id, input).await?;
    let status = if recorded.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(recorded.payment)))
}

async fn quote(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<PaymentInput>,
) -> AppResult<Json<PaymentQuote>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let quote = app_state.payment_use_cases.quote(gym_id, &input).await?;
    Ok(Json(quote))
}
