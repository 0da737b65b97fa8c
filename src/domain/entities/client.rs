use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Billing fields cached on the client row.
///
/// Rewritten with every payment; can always be rebuilt from the payment
/// history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClientSnapshot {
    pub current_plan: Option<String>,
    pub current_debt_cents: i64,
    pub active_until: Option<NaiveDate>,
    pub last_payment_date: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub gym_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub address_number: Option<String>,
    pub due_day: Option<i16>,
    #[sqlx(flatten)]
    pub snapshot: ClientSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// A client counts as active until the grace window after the last
    /// covered period closes. Clients that never paid are still active.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        match self.snapshot.active_until {
            Some(until) => until >= today,
            None => true,
        }
    }
}

/// Contact fields accepted when registering or editing a client.
#[derive(Debug, Clone, Default)]
pub struct ClientDetails {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub address_number: Option<String>,
    pub due_day: Option<i16>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub address_number: Option<String>,
    pub due_day: Option<i16>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.address_number.is_none()
            && self.due_day.is_none()
    }

    pub fn apply(self, details: &mut ClientDetails) {
        if let Some(name) = self.name {
            details.name = name;
        }
        if let Some(email) = self.email {
            details.email = Some(email);
        }
        if let Some(phone) = self.phone {
            details.phone = Some(phone);
        }
        if let Some(address) = self.address {
            details.address = Some(address);
        }
        if let Some(address_number) = self.address_number {
            details.address_number = Some(address_number);
        }
        if let Some(due_day) = self.due_day {
            details.due_day = Some(due_day);
        }
    }
}

impl From<&Client> for ClientDetails {
    fn from(client: &Client) -> Self {
        ClientDetails {
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
            address_number: client.address_number.clone(),
            due_day: client.due_day,
        }
    }
}
