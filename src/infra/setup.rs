use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{email::resend::ResendEmailSender, http::app_state::AppState},
    application::use_cases::{
        client::{ClientRepoTrait, ClientUseCases, EmailLogRepoTrait, PaymentRepoTrait},
        gym::{GymRepoTrait, GymUseCases},
        payment::PaymentUseCases,
        reminder::ReminderUseCases,
    },
    infra::{
        InfraError, config::AppConfig, postgres_persistence, rate_limit::RedisRateLimiter,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let rate_limiter = Arc::new(
        RedisRateLimiter::new(
            &config.redis_url,
            config.rate_limit_window_secs,
            config.rate_limit_per_ip,
            config.rate_limit_per_email,
        )
        .await?,
    );

    let gym_repo_arc = postgres_arc.clone() as Arc<dyn GymRepoTrait>;
    let client_repo_arc = postgres_arc.clone() as Arc<dyn ClientRepoTrait>;
    let payment_repo_arc = postgres_arc.clone() as Arc<dyn PaymentRepoTrait>;
    let email_log_repo_arc = postgres_arc.clone() as Arc<dyn EmailLogRepoTrait>;

    let reminder_use_cases = match &config.resend_api_key {
        Some(api_key) => {
            let sender = ResendEmailSender::new(api_key.clone(), config.email_from.clone())
                .map_err(InfraError::HttpClient)?;
            Some(Arc::new(ReminderUseCases::new(
                client_repo_arc.clone(),
                email_log_repo_arc.clone(),
                Arc::new(sender),
                config.reminder_days_before,
            )))
        }
        None => {
            tracing::warn!("RESEND_API_KEY not set, payment reminders are disabled");
            None
        }
    };

    Ok(AppState {
        gym_use_cases: Arc::new(GymUseCases::new(gym_repo_arc)),
        client_use_cases: Arc::new(ClientUseCases::new(
            client_repo_arc.clone(),
            payment_repo_arc.clone(),
            email_log_repo_arc,
        )),
        payment_use_cases: Arc::new(PaymentUseCases::new(client_repo_arc, payment_repo_arc)),
        reminder_use_cases,
        rate_limiter,
        config: Arc::new(config),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gymdesk=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs); skipped when the working directory is read-only.
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
