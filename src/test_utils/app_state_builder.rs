//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires an `AppState` from the in-memory doubles so
//! route tests can run without Postgres, Redis or an email provider.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        use_cases::{
            client::ClientUseCases, gym::GymUseCases, payment::PaymentUseCases,
            reminder::ReminderUseCases,
        },
    },
    domain::entities::{client::Client, gym::Gym, payment::Payment},
    infra::{RateLimiterTrait, config::AppConfig},
    test_utils::{
        InMemoryClientRepo, InMemoryEmailLogRepo, InMemoryEmailSender, InMemoryGymRepo,
        InMemoryPaymentRepo, InMemoryRateLimiter,
    },
};

/// Handles on the doubles behind a built `AppState`, for assertions.
pub struct TestRepos {
    pub gyms: Arc<InMemoryGymRepo>,
    pub clients: Arc<InMemoryClientRepo>,
    pub payments: Arc<InMemoryPaymentRepo>,
    pub email_logs: Arc<InMemoryEmailLogRepo>,
    pub email_sender: Arc<InMemoryEmailSender>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let gym = create_test_gym(|_| {});
/// let client = create_test_client(gym.id, |c| c.name = "Ana".into());
///
/// let app_state = TestAppStateBuilder::new()
///     .with_gym(gym)
///     .with_clients(vec![client])
///     .build();
/// ```
pub struct TestAppStateBuilder {
    gyms: Vec<Gym>,
    clients: Vec<Client>,
    payments: Vec<Payment>,
    rate_limiter: Option<Arc<dyn RateLimiterTrait>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            gyms: vec![],
            clients: vec![],
            payments: vec![],
            rate_limiter: None,
        }
    }

    pub fn with_gym(mut self, gym: Gym) -> Self {
        self.gyms.push(gym);
        self
    }

    pub fn with_clients(mut self, clients: Vec<Client>) -> Self {
        self.clients.extend(clients);
        self
    }

    pub fn with_payments(mut self, payments: Vec<Payment>) -> Self {
        self.payments.extend(payments);
        self
    }

    /// Replace the permissive default limiter.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_repos().0
    }

    /// Build the state and hand back the doubles behind it.
    pub fn build_with_repos(self) -> (AppState, TestRepos) {
        let gyms = Arc::new(InMemoryGymRepo::with_gyms(self.gyms.clone()));
        let clients = Arc::new(InMemoryClientRepo::with_clients(self.clients));
        for gym in &self.gyms {
            clients.set_gym_name(gym.id, &gym.name);
        }
        let payments = Arc::new(InMemoryPaymentRepo::new(clients.clone()));
        payments.seed(self.payments);
        let email_logs = Arc::new(InMemoryEmailLogRepo::new(clients.clone()));
        let email_sender = Arc::new(InMemoryEmailSender::new());

        let config = Arc::new(test_config());

        let app_state = AppState {
            gym_use_cases: Arc::new(GymUseCases::new(gyms.clone())),
            client_use_cases: Arc::new(ClientUseCases::new(
                clients.clone(),
                payments.clone(),
                email_logs.clone(),
            )),
            payment_use_cases: Arc::new(PaymentUseCases::new(clients.clone(), payments.clone())),
            reminder_use_cases: Some(Arc::new(ReminderUseCases::new(
                clients.clone(),
                email_logs.clone(),
                email_sender.clone(),
                config.reminder_days_before,
            ))),
            rate_limiter: self
                .rate_limiter
                .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::permissive())),
            config,
        };

        (
            app_state,
            TestRepos {
                gyms,
                clients,
                payments,
                email_logs,
                email_sender,
            },
        )
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        jwt_secret: SecretString::new("test_jwt_secret".into()),
        session_ttl: Duration::days(7),
        secure_cookies: false,
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        redis_url: String::new(),
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 60,
        rate_limit_per_email: 10,
        trust_proxy: false,
        resend_api_key: None,
        email_from: "gymdesk <no-reply@gymdesk.test>".to_string(),
        reminder_poll_secs: 3_600,
        reminder_days_before: 3,
        snapshot_audit_secs: 86_400,
    }
}

/// `Cookie` header value carrying a valid session for `gym_id`.
pub fn session_cookie(app_state: &AppState, gym_id: Uuid, email: &str) -> String {
    let token = jwt::issue(
        gym_id,
        email,
        &app_state.config.jwt_secret,
        app_state.config.session_ttl,
    )
    .unwrap();
    format!("session={token}")
}
