use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::plan::Plan;

/// Immutable record of money received for a client.
///
/// Amounts are integer minor units. `seq` is assigned by the store and
/// orders payments that share a creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub seq: i64,
    pub client_id: Uuid,
    pub amount_cents: i64,
    pub plan: String,
    pub discount_cents: i64,
    pub debt_cents: i64,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
    #[serde(skip_serializing)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn plan(&self) -> Option<Plan> {
        Plan::from_stored(&self.plan)
    }

    /// The date the client is due again according to this payment.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.period_to.or(self.next_payment_date)
    }
}

/// A validated payment ready to be appended. Written in the same
/// transaction as the client snapshot it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub client_id: Uuid,
    pub amount_cents: i64,
    pub plan: Plan,
    pub discount_cents: i64,
    pub debt_cents: i64,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    pub idempotency_key: Option<String>,
}
