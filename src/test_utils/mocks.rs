//! In-memory implementations of the repository and port traits.
//!
//! Payment and email log doubles share the client double so that deleting a
//! client hides its history, the way the foreign-key cascade does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        client::{
            ClientRepoTrait, EmailLogRepoTrait, PaymentDraft, PaymentRepoTrait,
            ReminderCandidate,
        },
        gym::{DUPLICATE_GYM_EMAIL, GymRepoTrait},
        payment::RecordedPayment,
        reminder::EmailSender,
    },
    domain::{
        billing::projector::sort_newest_first,
        entities::{
            client::{Client, ClientDetails, ClientSnapshot},
            email_log::{EmailKind, EmailLog, EmailStatus},
            gym::Gym,
            payment::Payment,
        },
    },
    infra::rate_limit::{RateLimiterTrait, email_key},
};

// ============================================================================
// InMemoryGymRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryGymRepo {
    pub gyms: Mutex<HashMap<Uuid, Gym>>,
}

impl InMemoryGymRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gyms(gyms: Vec<Gym>) -> Self {
        Self {
            gyms: Mutex::new(gyms.into_iter().map(|g| (g.id, g)).collect()),
        }
    }

    pub fn get_all(&self) -> Vec<Gym> {
        self.gyms.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl GymRepoTrait for InMemoryGymRepo {
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> AppResult<Gym> {
        let mut gyms = self.gyms.lock().unwrap();
        if gyms.values().any(|g| g.email == email) {
            return Err(AppError::InvalidInput(DUPLICATE_GYM_EMAIL.into()));
        }
        let gym = Gym {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        gyms.insert(gym.id, gym.clone());
        Ok(gym)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Gym>> {
        Ok(self
            .gyms
            .lock()
            .unwrap()
            .values()
            .find(|g| g.email == email)
            .cloned())
    }

    async fn get_by_id(&self, gym_id: Uuid) -> AppResult<Option<Gym>> {
        Ok(self.gyms.lock().unwrap().get(&gym_id).cloned())
    }
}

// ============================================================================
// InMemoryClientRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryClientRepo {
    /// Registration order.
    pub clients: Mutex<Vec<Client>>,
    pub gym_names: Mutex<HashMap<Uuid, String>>,
}

impl InMemoryClientRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(clients: Vec<Client>) -> Self {
        Self {
            clients: Mutex::new(clients),
            gym_names: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_gym_name(&self, gym_id: Uuid, name: &str) {
        self.gym_names
            .lock()
            .unwrap()
            .insert(gym_id, name.to_string());
    }

    pub fn get_all(&self) -> Vec<Client> {
        self.clients.lock().unwrap().clone()
    }

    pub fn get_all_by_id(&self, client_id: Uuid) -> Option<Client> {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == client_id)
            .cloned()
    }

    fn set_snapshot(&self, client_id: Uuid, snapshot: &ClientSnapshot) -> AppResult<()> {
        let mut clients = self.clients.lock().unwrap();
        let client = clients
            .iter_mut()
            .find(|c| c.id == client_id)
            .ok_or(AppError::NotFound)?;
        client.snapshot = snapshot.clone();
        Ok(())
    }

    fn exists(&self, client_id: Uuid) -> bool {
        self.clients.lock().unwrap().iter().any(|c| c.id == client_id)
    }
}

#[async_trait]
impl ClientRepoTrait for InMemoryClientRepo {
    async fn create(&self, gym_id: Uuid, details: &ClientDetails) -> AppResult<Client> {
        let client = Client {
            id: Uuid::new_v4(),
            gym_id,
            name: details.name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            address: details.address.clone(),
            address_number: details.address_number.clone(),
            due_day: details.due_day,
            snapshot: ClientSnapshot::default(),
            created_at: Utc::now(),
        };
        self.clients.lock().unwrap().push(client.clone());
        Ok(client)
    }

    async fn get(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Option<Client>> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == client_id && c.gym_id == gym_id)
            .cloned())
    }

    async fn list_by_gym(&self, gym_id: Uuid) -> AppResult<Vec<Client>> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.gym_id == gym_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<Client>> {
        Ok(self.get_all())
    }

    async fn update(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        details: &ClientDetails,
    ) -> AppResult<Option<Client>> {
        let mut clients = self.clients.lock().unwrap();
        let Some(client) = clients
            .iter_mut()
            .find(|c| c.id == client_id && c.gym_id == gym_id)
        else {
            return Ok(None);
        };
        client.name = details.name.clone();
        client.email = details.email.clone();
        client.phone = details.phone.clone();
        client.address = details.address.clone();
        client.address_number = details.address_number.clone();
        client.due_day = details.due_day;
        Ok(Some(client.clone()))
    }

    async fn delete(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<bool> {
        let mut clients = self.clients.lock().unwrap();
        let before = clients.len();
        clients.retain(|c| !(c.id == client_id && c.gym_id == gym_id));
        Ok(clients.len() < before)
    }

    async fn overwrite_snapshot(
        &self,
        client_id: Uuid,
        snapshot: &ClientSnapshot,
    ) -> AppResult<()> {
        self.set_snapshot(client_id, snapshot)
    }

    async fn list_reminder_candidates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<ReminderCandidate>> {
        let names = self.gym_names.lock().unwrap();
        let mut candidates: Vec<ReminderCandidate> = self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.snapshot
                    .next_payment_date
                    .is_some_and(|due| due >= from && due <= to)
            })
            .map(|c| ReminderCandidate {
                client: c.clone(),
                gym_name: names
                    .get(&c.gym_id)
                    .cloned()
                    .unwrap_or_else(|| "Test Gym".to_string()),
            })
            .collect();
        candidates.sort_by_key(|c| c.client.snapshot.next_payment_date);
        Ok(candidates)
    }
}

// ============================================================================
// InMemoryPaymentRepo
// ============================================================================

pub struct InMemoryPaymentRepo {
    pub payments: Mutex<Vec<Payment>>,
    next_seq: AtomicI64,
    clients: Arc<InMemoryClientRepo>,
}

impl InMemoryPaymentRepo {
    pub fn new(clients: Arc<InMemoryClientRepo>) -> Self {
        Self {
            payments: Mutex::new(Vec::new()),
            next_seq: AtomicI64::new(1),
            clients,
        }
    }

    /// Insert rows as-is, assigning `seq` where it is left at 0.
    pub fn seed(&self, payments: Vec<Payment>) {
        let mut stored = self.payments.lock().unwrap();
        for mut payment in payments {
            if payment.seq == 0 {
                payment.seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            } else {
                self.next_seq.fetch_max(payment.seq + 1, Ordering::SeqCst);
            }
            stored.push(payment);
        }
    }

    /// Payments whose client still exists.
    pub fn get_all(&self) -> Vec<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| self.clients.exists(p.client_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PaymentRepoTrait for InMemoryPaymentRepo {
    async fn list_for_client(&self, client_id: Uuid) -> AppResult<Vec<Payment>> {
        tokio::task::yield_now().await;
        let mut payments: Vec<Payment> = self
            .get_all()
            .into_iter()
            .filter(|p| p.client_id == client_id)
            .collect();
        sort_newest_first(&mut payments);
        Ok(payments)
    }

    async fn list_for_clients(&self, client_ids: &[Uuid]) -> AppResult<Vec<Payment>> {
        Ok(self
            .get_all()
            .into_iter()
            .filter(|p| client_ids.contains(&p.client_id))
            .collect())
    }

    async fn record(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        idempotency_key: Option<&str>,
        draft: &PaymentDraft<'_>,
    ) -> AppResult<RecordedPayment> {
        tokio::task::yield_now().await;
        let client = self
            .clients
            .get_all_by_id(client_id)
            .filter(|c| c.gym_id == gym_id)
            .ok_or(AppError::NotFound)?;

        // Held until the row is stored, like the client row lock.
        let mut payments = self.payments.lock().unwrap();
        let mut history: Vec<Payment> = payments
            .iter()
            .filter(|p| p.client_id == client.id)
            .cloned()
            .collect();
        if let Some(key) = idempotency_key
            && let Some(existing) = history
                .iter()
                .find(|p| p.idempotency_key.as_deref() == Some(key))
        {
            return Ok(RecordedPayment {
                payment: existing.clone(),
                replayed: true,
            });
        }
        sort_newest_first(&mut history);

        let (payment, snapshot) = draft(&client, &history)?;
        self.clients.set_snapshot(client.id, &snapshot)?;

        let row = Payment {
            id: Uuid::new_v4(),
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            client_id: client.id,
            amount_cents: payment.amount_cents,
            plan: payment.plan.to_string(),
            discount_cents: payment.discount_cents,
            debt_cents: payment.debt_cents,
            period_from: payment.period_from,
            period_to: payment.period_to,
            next_payment_date: payment.period_to,
            idempotency_key: payment.idempotency_key,
            created_at: Utc::now(),
        };
        payments.push(row.clone());
        Ok(RecordedPayment {
            payment: row,
            replayed: false,
        })
    }
}

// ============================================================================
// InMemoryEmailLogRepo
// ============================================================================

pub struct InMemoryEmailLogRepo {
    pub logs: Mutex<Vec<EmailLog>>,
    clients: Arc<InMemoryClientRepo>,
    failing_inserts: AtomicBool,
}

impl InMemoryEmailLogRepo {
    pub fn new(clients: Arc<InMemoryClientRepo>) -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
            clients,
            failing_inserts: AtomicBool::new(false),
        }
    }

    /// Make subsequent inserts fail until switched back.
    pub fn fail_inserts(&self, failing: bool) {
        self.failing_inserts.store(failing, Ordering::SeqCst);
    }

    /// Logs whose client still exists, oldest first.
    pub fn get_all(&self) -> Vec<EmailLog> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| self.clients.exists(l.client_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EmailLogRepoTrait for InMemoryEmailLogRepo {
    async fn list_for_client(&self, client_id: Uuid) -> AppResult<Vec<EmailLog>> {
        let mut logs: Vec<EmailLog> = self
            .get_all()
            .into_iter()
            .filter(|l| l.client_id == client_id)
            .collect();
        logs.reverse();
        Ok(logs)
    }

    async fn has_sent(
        &self,
        client_id: Uuid,
        kind: EmailKind,
        due_date: NaiveDate,
    ) -> AppResult<bool> {
        Ok(self.get_all().iter().any(|l| {
            l.client_id == client_id
                && l.kind == kind
                && l.due_date == Some(due_date)
                && l.status == EmailStatus::Sent
        }))
    }

    async fn insert(
        &self,
        client_id: Uuid,
        kind: EmailKind,
        subject: &str,
        due_date: Option<NaiveDate>,
        status: EmailStatus,
    ) -> AppResult<EmailLog> {
        if self.failing_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database("email_logs unavailable".into()));
        }
        let log = EmailLog {
            id: Uuid::new_v4(),
            client_id,
            sent_at: Utc::now(),
            kind,
            subject: subject.to_string(),
            due_date,
            status,
        };
        self.logs.lock().unwrap().push(log.clone());
        Ok(log)
    }
}

// ============================================================================
// InMemoryEmailSender
// ============================================================================

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Records every email instead of sending it.
#[derive(Default)]
pub struct InMemoryEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail until switched back.
    pub fn fail_next(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("Email API error: 503".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
    max_per_email: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64, max_per_email: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
            max_per_email,
        }
    }

    /// Never blocks.
    pub fn permissive() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }

    fn bump(&self, key: String, limit: u64) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key).or_insert(0);
        *count += 1;
        if *count > limit {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check_ip(&self, ip: &str) -> AppResult<()> {
        self.bump(format!("rate:ip:{ip}"), self.max_per_ip)
    }

    async fn check_email(&self, email: &str) -> AppResult<()> {
        self.bump(format!("rate:email:{}", email_key(email)), self.max_per_email)
    }
}
