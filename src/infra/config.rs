use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: SecretString,
    pub session_ttl: Duration,
    /// Marks the session cookie `Secure`. Enable whenever the API is served over HTTPS.
    pub secure_cookies: bool,
    pub bind_addr: SocketAddr,
    /// Where the dashboard is served from.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_email: u64,
    /// Whether to trust X-Forwarded-For headers. Only enable behind a reverse proxy.
    pub trust_proxy: bool,
    /// Reminder emails are disabled when unset.
    pub resend_api_key: Option<SecretString>,
    pub email_from: String,
    pub reminder_poll_secs: u64,
    pub reminder_days_before: i64,
    pub snapshot_audit_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url: String = get_env("DATABASE_URL");
        let jwt_secret = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let session_ttl_days: i64 = get_env_default("SESSION_TTL_DAYS", 7);
        let secure_cookies: bool = get_env_default("SECURE_COOKIES", false);

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let app_origin: Url = get_env_default(
            "APP_ORIGIN",
            Url::parse("http://localhost:3000").expect("static url"),
        );
        // The dashboard origin doubles as the CORS origin unless overridden.
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", app_origin.origin().ascii_serialization())
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        let rate_limit_per_email: u64 = get_env_default("RATE_LIMIT_PER_EMAIL", 10);
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let resend_api_key = std::env::var("RESEND_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|k| SecretString::new(k.into()));
        let email_from: String = get_env_default(
            "EMAIL_FROM",
            "gymdesk <no-reply@gymdesk.local>".to_string(),
        );
        let reminder_poll_secs: u64 = get_env_default("REMINDER_POLL_SECS", 3_600);
        let reminder_days_before: i64 = get_env_default("REMINDER_DAYS_BEFORE", 3);
        let snapshot_audit_secs: u64 = get_env_default("SNAPSHOT_AUDIT_SECS", 86_400);

        Self {
            database_url,
            jwt_secret,
            session_ttl: Duration::days(session_ttl_days),
            secure_cookies,
            bind_addr,
            app_origin,
            cors_origin,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_email,
            trust_proxy,
            resend_api_key,
            email_from,
            reminder_poll_secs,
            reminder_days_before,
            snapshot_audit_secs,
        }
    }
}
