use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, routes::auth::current_gym},
    app_error::AppResult,
    application::roster::{ClientView, RosterQuery, RosterStats},
    domain::entities::{
        client::{ClientDetails, ClientPatch},
        email_log::EmailLog,
    },
    use_cases::client::SnapshotAudit,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateClientPayload {
    #[serde(default)]
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    address_number: Option<String>,
    due_day: Option<i16>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateClientPayload {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    address_number: Option<String>,
    due_day: Option<i16>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AuditParams {
    repair: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/stats", get(stats))
        .route("/snapshots/audit", post(audit_snapshots))
        .route(
            "/{id}",
            get(get_client).patch(update_client).delete(delete_client),
        )
        .route("/{id}/emails", get(list_emails))
}

async fn list_clients(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RosterQuery>,
) -> AppResult<Json<Vec<ClientView>>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let clients = app_state
        .client_use_cases
        .list_clients(gym_id, &query)
        .await?;
    Ok(Json(clients))
}

async fn create_client(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreateClientPayload>,
) -> AppResult<(StatusCode, Json<ClientView>)> {
    let gym_id = current_gym(&jar, &app_state)?;
    let details = ClientDetails {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        address_number: payload.address_number,
        due_day: payload.due_day,
    };
    let client = app_state
        .client_use_cases
        .create_client(gym_id, details)
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn stats(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<RosterStats>> {
    let gym_id = current_gym(&jar, &app_state)?;
    Ok(Json(app_state.client_use_cases.stats(gym_id).await?))
}

/// Dry run unless `?repair=true`.
async fn audit_snapshots(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<AuditParams>,
) -> AppResult<Json<SnapshotAudit>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let report = app_state
        .client_use_cases
        .audit_snapshots(gym_id, params.repair)
        .await?;
    Ok(Json(report))
}

async fn get_client(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<ClientView>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let client = app_state
        .client_use_cases
        .get_client(gym_id, client_id)
        .await?;
    Ok(Json(client))
}

async fn update_client(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<UpdateClientPayload>,
) -> AppResult<Json<ClientView>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let patch = ClientPatch {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        address_number: payload.address_number,
        due_day: payload.due_day,
    };
    let client = app_state
        .client_use_cases
        .update_client(gym_id, client_id, patch)
        .await?;
    Ok(Json(client))
}

async fn delete_client(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(client_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let gym_id = current_gym(&jar, &app_state)?;
    app_state
        .client_use_cases
        .delete_client(gym_id, client_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_emails(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<Vec<EmailLog>>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let logs = app_state
        .client_use_cases
        .list_emails(gym_id, client_id)
        .await?;
    Ok(Json(logs))
}
