use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
    domain::entities::gym::Gym,
};

pub const SESSION_COOKIE: &str = "session";
/// Readable by the dashboard.
pub const EMAIL_COOKIE: &str = "gym_email";

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GymResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<Gym> for GymResponse {
    fn from(gym: Gym) -> Self {
        Self {
            id: gym.id,
            name: gym.name,
            email: gym.email,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<(HeaderMap, Json<GymResponse>)> {
    // Counted before the password check so guesses spread over many
    // addresses still share one budget.
    app_state.rate_limiter.check_email(&payload.email).await?;
    let gym = app_state
        .gym_use_cases
        .login(&payload.email, &payload.password)
        .await?;
    tracing::info!(gym_id = %gym.id, "Gym logged in");
    let headers = session_headers(&app_state, &gym)?;
    Ok((headers, Json(gym.into())))
}

async fn logout(State(app_state): State<AppState>) -> AppResult<(StatusCode, HeaderMap)> {
    let mut headers = HeaderMap::new();
    for (name, http_only) in [(SESSION_COOKIE, true), (EMAIL_COOKIE, false)] {
        let cookie = Cookie::build((name, ""))
            .http_only(http_only)
            .secure(app_state.config.secure_cookies)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(0))
            .build();
        headers.append(SET_COOKIE, header_value(&cookie)?);
    }
    Ok((StatusCode::NO_CONTENT, headers))
}

async fn me(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<GymResponse>> {
    let gym_id = current_gym(&jar, &app_state)?;
    let gym = app_state.gym_use_cases.profile(gym_id).await?;
    Ok(Json(gym.into()))
}

/// Set-Cookie headers for a fresh session.
pub(super) fn session_headers(app_state: &AppState, gym: &Gym) -> AppResult<HeaderMap> {
    let config = &app_state.config;
    let token = jwt::issue(gym.id, &gym.email, &config.jwt_secret, config.session_ttl)?;

    let session = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(config.session_ttl)
        .build();
    let email = Cookie::build((EMAIL_COOKIE, gym.email.clone()))
        .http_only(false)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(config.session_ttl)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, header_value(&session)?);
    headers.append(SET_COOKIE, header_value(&email)?);
    Ok(headers)
}

/// The gym the session cookie belongs to.
pub(super) fn current_gym(jar: &CookieJar, app_state: &AppState) -> AppResult<Uuid> {
    let session = jar.get(SESSION_COOKIE).ok_or(AppError::InvalidCredentials)?;
    let claims = jwt::verify(session.value(), &app_state.config.jwt_secret)?;
    claims.gym_id()
}

fn header_value(cookie: &Cookie<'_>) -> AppResult<HeaderValue> {
    cookie
        .to_string()
        .parse()
        .map_err(|_| AppError::Internal("Cookie is not a valid header value".into()))
}
