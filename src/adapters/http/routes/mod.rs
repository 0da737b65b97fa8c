pub mod auth;
pub mod clients;
pub mod gym;
pub mod payments;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/gym", gym::router())
        .nest("/auth", auth::router())
        .nest("/clients", clients::router())
        .nest("/payments", payments::router())
}
