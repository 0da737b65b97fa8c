//! Test data factories.
//!
//! Each factory returns a complete, valid object. Use the closure parameter to
//! override specific fields.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    client::{Client, ClientSnapshot},
    gym::Gym,
    payment::Payment,
};

/// Create a test gym. The password hash is not a valid argon2 hash.
pub fn create_test_gym(overrides: impl FnOnce(&mut Gym)) -> Gym {
    let mut gym = Gym {
        id: Uuid::new_v4(),
        name: "Iron Gym".to_string(),
        email: "front@iron.test".to_string(),
        password_hash: "not-a-hash".to_string(),
        created_at: Utc::now(),
    };
    overrides(&mut gym);
    gym
}

/// Create a test client that has never paid.
pub fn create_test_client(gym_id: Uuid, overrides: impl FnOnce(&mut Client)) -> Client {
    let mut client = Client {
        id: Uuid::new_v4(),
        gym_id,
        name: "Test Client".to_string(),
        email: None,
        phone: None,
        address: None,
        address_number: None,
        due_day: Some(10),
        snapshot: ClientSnapshot::default(),
        created_at: Utc::now(),
    };
    overrides(&mut client);
    client
}

/// Create a test payment covering March 2025 with nothing left owed.
///
/// `seq` is left at 0 so in-memory stores assign one; set it explicitly
/// when ordering matters.
pub fn create_test_payment(client_id: Uuid, overrides: impl FnOnce(&mut Payment)) -> Payment {
    let mut payment = Payment {
        id: Uuid::new_v4(),
        seq: 0,
        client_id,
        amount_cents: 1_000,
        plan: "Basic".to_string(),
        discount_cents: 0,
        debt_cents: 0,
        period_from: NaiveDate::from_ymd_opt(2025, 3, 1),
        period_to: NaiveDate::from_ymd_opt(2025, 3, 31),
        next_payment_date: None,
        idempotency_key: None,
        created_at: Utc::now(),
    };
    overrides(&mut payment);
    payment
}
