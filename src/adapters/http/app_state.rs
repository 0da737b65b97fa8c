use std::sync::Arc;

use crate::{
    infra::{RateLimiterTrait, config::AppConfig},
    use_cases::{
        client::ClientUseCases, gym::GymUseCases, payment::PaymentUseCases,
        reminder::ReminderUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gym_use_cases: Arc<GymUseCases>,
    pub client_use_cases: Arc<ClientUseCases>,
    pub payment_use_cases: Arc<PaymentUseCases>,
    /// `None` when no email provider is configured.
    pub reminder_use_cases: Option<Arc<ReminderUseCases>>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
