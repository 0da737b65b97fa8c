use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Membership plans a payment can be recorded against.
///
/// The wire and storage form is the name shown at the front desk, so a
/// payment row reads `"Pro fitness"` rather than an internal code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Plan {
    #[serde(rename = "Basic")]
    #[strum(serialize = "Basic")]
    Basic,
    #[serde(rename = "Fitness")]
    #[strum(serialize = "Fitness")]
    Fitness,
    #[serde(rename = "Pro fitness")]
    #[strum(serialize = "Pro fitness")]
    ProFitness,
    /// Settles outstanding debt instead of buying a new period.
    #[serde(rename = "Pago deuda")]
    #[strum(serialize = "Pago deuda")]
    DebtSettlement,
}

impl Plan {
    pub fn is_debt_settlement(&self) -> bool {
        matches!(self, Plan::DebtSettlement)
    }

    /// Parse a stored plan name. Unknown names (legacy rows) yield `None`.
    pub fn from_stored(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}
