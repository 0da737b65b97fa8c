use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::client::{ClientRepoTrait, PaymentRepoTrait},
    domain::{
        billing::{
            projector::latest_payment,
            reconciler::{Reconciliation, Submission, snapshot_after},
        },
        entities::{
            client::{Client, ClientSnapshot},
            payment::{NewPayment, Payment},
            plan::Plan,
        },
    },
};

/// Raw payment form as submitted by the front desk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub client_id: Option<Uuid>,
    pub plan: Option<String>,
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub discount_cents: i64,
    pub charge_cents: Option<i64>,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    #[serde(alias = "idempotency_key")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedPeriod {
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    pub client_id: Uuid,
    pub plan: Plan,
    pub prior_debt_cents: i64,
    pub amount_cents: i64,
    pub discount_cents: i64,
    pub debt_cents: i64,
    pub amount_defaulted: bool,
    /// Debt settlement whenever the client owes money.
    pub suggested_plan: Option<Plan>,
    /// Period of the latest payment that left debt behind.
    pub locked_period: Option<LockedPeriod>,
}

#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    /// True when an earlier submission with the same idempotency key was
    /// returned instead of writing a new payment.
    pub replayed: bool,
}

#[derive(Clone)]
pub struct PaymentUseCases {
    clients: Arc<dyn ClientRepoTrait>,
    payments: Arc<dyn PaymentRepoTrait>,
}

impl PaymentUseCases {
    pub fn new(clients: Arc<dyn ClientRepoTrait>, payments: Arc<dyn PaymentRepoTrait>) -> Self {
        Self { clients, payments }
    }

    /// Payment history of one client, newest first.
    #[instrument(skip(self))]
    pub async fn history(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Vec<Payment>> {
        let client = self.require_client(gym_id, client_id).await?;
        self.payments.list_for_client(client.id).await
    }

    /// Reconcile a submission without writing anything.
    ///
    /// The plan may be omitted when the client owes money; the quote then
    /// assumes a debt settlement.
    #[instrument(skip(self, input))]
    pub async fn quote(&self, gym_id: Uuid, input: &PaymentInput) -> AppResult<PaymentQuote> {
        let client_id = input
            .client_id
            .ok_or_else(|| AppError::InvalidInput("clientId is required".into()))?;
        let client = self.require_client(gym_id, client_id).await?;
        let history = self.payments.list_for_client(client.id).await?;
        let prior_debt_cents = prior_debt(&history);

        let plan = match input.plan.as_deref() {
            Some(raw) => parse_plan(raw)?,
            None if prior_debt_cents > 0 => Plan::DebtSettlement,
            None => return Err(AppError::InvalidInput("plan is required".into())),
        };

        let result = submission(plan, prior_debt_cents, input).reconcile()?;
        let owes = prior_debt_cents > 0;

        Ok(PaymentQuote {
            client_id: client.id,
            plan,
            prior_debt_cents,
            amount_cents: result.amount_cents,
            discount_cents: result.discount_cents,
            debt_cents: result.debt_cents,
            amount_defaulted: result.amount_defaulted,
            suggested_plan: owes.then_some(Plan::DebtSettlement),
            locked_period: if owes { locked_period(&history) } else { None },
        })
    }

    /// Append a payment and rewrite the client snapshot.
    ///
    /// Prior debt is read while the client is locked, so two submissions for
    /// the same client never reconcile against the same balance. Nothing is
    /// written when validation fails. A repeated idempotency key returns the
    /// payment recorded the first time.
    #[instrument(skip(self, input))]
    pub async fn record(&self, gym_id: Uuid, input: PaymentInput) -> AppResult<RecordedPayment> {
        let (Some(client_id), Some(raw_plan)) = (input.client_id, input.plan.as_deref()) else {
            return Err(AppError::InvalidInput("clientId and plan are required".into()));
        };
        let plan = parse_plan(raw_plan)?;

        let idempotency_key = input
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        let today = Local::now().date_naive();

        let draft = |client: &Client,
                     history: &[Payment]|
         -> AppResult<(NewPayment, ClientSnapshot)> {
            let Reconciliation {
                amount_cents,
                discount_cents,
                debt_cents,
                ..
            } = submission(plan, prior_debt(history), &input).reconcile()?;
            let snapshot =
                snapshot_after(&client.snapshot, plan, debt_cents, input.period_to, today);
            let payment = NewPayment {
                client_id: client.id,
                amount_cents,
                plan,
                discount_cents,
                debt_cents,
                period_from: input.period_from,
                period_to: input.period_to,
                idempotency_key: idempotency_key.clone(),
            };
            Ok((payment, snapshot))
        };

        let recorded = self
            .payments
            .record(gym_id, client_id, idempotency_key.as_deref(), &draft)
            .await?;
        if recorded.replayed {
            tracing::info!(payment_id = %recorded.payment.id, "Replaying idempotent payment");
        } else {
            tracing::info!(
                payment_id = %recorded.payment.id,
                %client_id,
                amount_cents = recorded.payment.amount_cents,
                debt_cents = recorded.payment.debt_cents,
                "Payment recorded"
            );
        }
        Ok(recorded)
    }

    async fn require_client(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Client> {
        self.clients
            .get(gym_id, client_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

fn parse_plan(raw: &str) -> AppResult<Plan> {
    Plan::from_stored(raw.trim())
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown plan: {}", raw.trim())))
}

/// Debt carried by the client according to its history.
fn prior_debt(history: &[Payment]) -> i64 {
    latest_payment(history)
        .map(|p| p.debt_cents.max(0))
        .unwrap_or(0)
}

fn locked_period(history: &[Payment]) -> Option<LockedPeriod> {
    history
        .iter()
        .filter(|p| p.debt_cents > 0)
        .max_by_key(|p| (p.created_at, p.seq))
        .map(|p| LockedPeriod {
            period_from: p.period_from,
            period_to: p.period_to,
        })
}

fn submission(plan: Plan, prior_debt_cents: i64, input: &PaymentInput) -> Submission {
    Submission {
        plan,
        prior_debt_cents,
        charge_cents: input.charge_cents.unwrap_or(0),
        amount_cents: input.amount_cents,
        discount_cents: input.discount_cents,
        period_from: input.period_from,
        period_to: input.period_to,
    }
}
