use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        roster::{self, ClientView, RosterQuery, RosterStats, RosterStatus},
        use_cases::payment::RecordedPayment,
        validators::{is_valid_due_day, is_valid_email, normalize_optional},
    },
    domain::{
        billing::projector::{project, rebuild_snapshot, snapshot_drifted},
        entities::{
            client::{Client, ClientDetails, ClientPatch, ClientSnapshot},
            email_log::{EmailKind, EmailLog, EmailStatus},
            payment::{NewPayment, Payment},
        },
    },
};

/// A client due for a reminder, with the name of the gym it belongs to.
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    pub client: Client,
    pub gym_name: String,
}

#[async_trait]
pub trait ClientRepoTrait: Send + Sync {
    async fn create(&self, gym_id: Uuid, details: &ClientDetails) -> AppResult<Client>;
    /// Scoped lookup: a client of another gym is reported as absent.
    async fn get(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Option<Client>>;
    /// Registration order.
    async fn list_by_gym(&self, gym_id: Uuid) -> AppResult<Vec<Client>>;
    async fn list_all(&self) -> AppResult<Vec<Client>>;
    async fn update(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        details: &ClientDetails,
    ) -> AppResult<Option<Client>>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<bool>;
    async fn overwrite_snapshot(&self, client_id: Uuid, snapshot: &ClientSnapshot)
    -> AppResult<()>;
    /// Clients whose next payment date lies in `[from, to]`.
    async fn list_reminder_candidates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<ReminderCandidate>>;
}

/// Turns the locked client and its history (newest first) into the payment
/// to append and the snapshot it leaves behind.
pub type PaymentDraft<'a> =
    dyn Fn(&Client, &[Payment]) -> AppResult<(NewPayment, ClientSnapshot)> + Send + Sync + 'a;

#[async_trait]
pub trait PaymentRepoTrait: Send + Sync {
    /// Newest first.
    async fn list_for_client(&self, client_id: Uuid) -> AppResult<Vec<Payment>>;
    async fn list_for_clients(&self, client_ids: &[Uuid]) -> AppResult<Vec<Payment>>;
    /// Lock the client, then either replay the payment already stored under
    /// `idempotency_key` or append the one `draft` builds and overwrite the
    /// snapshot. History is read under the lock, so concurrent submissions
    /// for one client reconcile one after the other. A `draft` error writes
    /// nothing.
    async fn record(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        idempotency_key: Option<&str>,
        draft: &PaymentDraft<'_>,
    ) -> AppResult<RecordedPayment>;
}

#[async_trait]
pub trait EmailLogRepoTrait: Send + Sync {
    /// Newest first.
    async fn list_for_client(&self, client_id: Uuid) -> AppResult<Vec<EmailLog>>;
    async fn has_sent(&self, client_id: Uuid, kind: EmailKind, due_date: NaiveDate)
    -> AppResult<bool>;
    async fn insert(
        &self,
        client_id: Uuid,
        kind: EmailKind,
        subject: &str,
        due_date: Option<NaiveDate>,
        status: EmailStatus,
    ) -> AppResult<EmailLog>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDrift {
    pub client_id: Uuid,
    pub stored: ClientSnapshot,
    pub rebuilt: ClientSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotAudit {
    pub checked: usize,
    pub drifted: Vec<SnapshotDrift>,
    pub repaired: bool,
}

#[derive(Clone)]
pub struct ClientUseCases {
    clients: Arc<dyn ClientRepoTrait>,
    payments: Arc<dyn PaymentRepoTrait>,
    email_logs: Arc<dyn EmailLogRepoTrait>,
}

impl ClientUseCases {
    pub fn new(
        clients: Arc<dyn ClientRepoTrait>,
        payments: Arc<dyn PaymentRepoTrait>,
        email_logs: Arc<dyn EmailLogRepoTrait>,
    ) -> Self {
        Self {
            clients,
            payments,
            email_logs,
        }
    }

    // ========================================================================
    // Roster CRUD
    // ========================================================================

    #[instrument(skip(self, details))]
    pub async fn create_client(&self, gym_id: Uuid, details: ClientDetails) -> AppResult<ClientView> {
        let details = validate_details(details)?;
        let client = self.clients.create(gym_id, &details).await?;
        tracing::info!(client_id = %client.id, "Client registered");
        Ok(ClientView {
            client,
            status: Default::default(),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_clients(&self, gym_id: Uuid, query: &RosterQuery) -> AppResult<Vec<ClientView>> {
        let views = self.views_for_gym(gym_id).await?;
        Ok(roster::apply(views, query, today()))
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<ClientView> {
        let client = self.require_client(gym_id, client_id).await?;
        let payments = self.payments.list_for_client(client.id).await?;
        let status = project(&payments, &Local::now());
        Ok(ClientView { client, status })
    }

    #[instrument(skip(self, patch))]
    pub async fn update_client(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        patch: ClientPatch,
    ) -> AppResult<ClientView> {
        let existing = self.require_client(gym_id, client_id).await?;
        if patch.is_empty() {
            return self.get_client(gym_id, client_id).await;
        }

        let mut details = ClientDetails::from(&existing);
        patch.apply(&mut details);
        let details = validate_details(details)?;

        self.clients
            .update(gym_id, client_id, &details)
            .await?
            .ok_or(AppError::NotFound)?;
        self.get_client(gym_id, client_id).await
    }

    /// Payments and email logs go with the client.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<()> {
        if !self.clients.delete(gym_id, client_id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(%client_id, "Client deleted");
        Ok(())
    }

    /// Totals over the whole roster, active or not.
    #[instrument(skip(self))]
    pub async fn stats(&self, gym_id: Uuid) -> AppResult<RosterStats> {
        let views = self.views_for_gym(gym_id).await?;
        let query = RosterQuery {
            status: RosterStatus::All,
            ..Default::default()
        };
        Ok(roster::stats(&roster::apply(views, &query, today())))
    }

    #[instrument(skip(self))]
    pub async fn list_emails(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Vec<EmailLog>> {
        let client = self.require_client(gym_id, client_id).await?;
        self.email_logs.list_for_client(client.id).await
    }

    // ========================================================================
    // Snapshot audit
    // ========================================================================

    /// Compare every stored snapshot of a gym with one rebuilt from history.
    #[instrument(skip(self))]
    pub async fn audit_snapshots(&self, gym_id: Uuid, repair: bool) -> AppResult<SnapshotAudit> {
        let clients = self.clients.list_by_gym(gym_id).await?;
        self.audit(clients, repair).await
    }

    /// Same audit across every gym; run by the background worker.
    #[instrument(skip(self))]
    pub async fn audit_all_snapshots(&self, repair: bool) -> AppResult<SnapshotAudit> {
        let clients = self.clients.list_all().await?;
        self.audit(clients, repair).await
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    async fn require_client(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Client> {
        self.clients
            .get(gym_id, client_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn views_for_gym(&self, gym_id: Uuid) -> AppResult<Vec<ClientView>> {
        let clients = self.clients.list_by_gym(gym_id).await?;
        let mut by_client = self.payments_by_client(&clients).await?;
        let now = Local::now();

        Ok(clients
            .into_iter()
            .map(|client| {
                let payments = by_client.remove(&client.id).unwrap_or_default();
                let status = project(&payments, &now);
                ClientView { client, status }
            })
            .collect())
    }

    async fn payments_by_client(&self, clients: &[Client]) -> AppResult<HashMap<Uuid, Vec<Payment>>> {
        if clients.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<Uuid> = clients.iter().map(|c| c.id).collect();
        let mut by_client: HashMap<Uuid, Vec<Payment>> = HashMap::new();
        for payment in self.payments.list_for_clients(&ids).await? {
            by_client.entry(payment.client_id).or_default().push(payment);
        }
        Ok(by_client)
    }

    async fn audit(&self, clients: Vec<Client>, repair: bool) -> AppResult<SnapshotAudit> {
        let mut by_client = self.payments_by_client(&clients).await?;
        let mut drifted = Vec::new();

        for client in &clients {
            let payments = by_client.remove(&client.id).unwrap_or_default();
            let rebuilt = rebuild_snapshot(&payments, &Local);
            if !snapshot_drifted(&client.snapshot, &rebuilt) {
                continue;
            }

            tracing::warn!(
                client_id = %client.id,
                stored_debt = client.snapshot.current_debt_cents,
                rebuilt_debt = rebuilt.current_debt_cents,
                "Client snapshot drifted from payment history"
            );
            if repair {
                self.clients.overwrite_snapshot(client.id, &rebuilt).await?;
            }
            drifted.push(SnapshotDrift {
                client_id: client.id,
                stored: client.snapshot.clone(),
                rebuilt,
            });
        }

        Ok(SnapshotAudit {
            checked: clients.len(),
            drifted,
            repaired: repair,
        })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn validate_details(details: ClientDetails) -> AppResult<ClientDetails> {
    let name = details.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name is required".into()));
    }

    let email = normalize_optional(details.email);
    if let Some(email) = &email
        && !is_valid_email(email)
    {
        return Err(AppError::InvalidInput("Invalid email address".into()));
    }

    if let Some(day) = details.due_day
        && !is_valid_due_day(day)
    {
        return Err(AppError::InvalidInput("dueDay must be between 1 and 31".into()));
    }

    Ok(ClientDetails {
        name,
        email,
        phone: normalize_optional(details.phone),
        address: normalize_optional(details.address),
        address_number: normalize_optional(details.address_number),
        due_day: details.due_day,
    })
}
