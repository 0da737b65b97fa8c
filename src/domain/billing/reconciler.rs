use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::domain::entities::{client::ClientSnapshot, plan::Plan};

/// Days a client stays active after the last covered period ends.
pub const ACTIVE_GRACE_DAYS: i64 = 45;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("periodFrom must not be after periodTo")]
    InvertedPeriod,
}

/// Debt left after applying a payment and a discount to a balance.
pub fn reconcile(prior_debt: i64, amount_paid: i64, discount: i64) -> i64 {
    prior_debt
        .saturating_sub(amount_paid)
        .saturating_sub(discount)
        .max(0)
}

/// Amount that settles `prior_debt` once `discount` is applied.
pub fn settlement_amount(prior_debt: i64, discount: i64) -> i64 {
    prior_debt.saturating_sub(discount).max(0)
}

/// A payment submission before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub plan: Plan,
    pub prior_debt_cents: i64,
    /// Price billed for the covered period, added on top of prior debt.
    pub charge_cents: i64,
    /// `None` lets the debt-settlement plan fill it in.
    pub amount_cents: Option<i64>,
    pub discount_cents: i64,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub amount_cents: i64,
    pub discount_cents: i64,
    pub debt_cents: i64,
    /// True when the amount was computed instead of taken from the caller.
    pub amount_defaulted: bool,
}

impl Submission {
    /// Validate and compute the amount and resulting debt.
    ///
    /// For the debt-settlement plan a missing amount, or one larger than the
    /// balance, becomes `balance - discount`. Other plans take the amount as
    /// given, defaulting to nothing paid.
    pub fn reconcile(&self) -> Result<Reconciliation, ReconcileError> {
        check_non_negative("priorDebt", self.prior_debt_cents)?;
        check_non_negative("charge", self.charge_cents)?;
        check_non_negative("discount", self.discount_cents)?;
        if let Some(amount) = self.amount_cents {
            check_non_negative("amount", amount)?;
        }
        check_period(self.period_from, self.period_to)?;

        let balance = self.prior_debt_cents.saturating_add(self.charge_cents);

        let (amount_cents, amount_defaulted) = if self.plan.is_debt_settlement() {
            match self.amount_cents {
                Some(amount) if amount <= balance => (amount, false),
                _ => (settlement_amount(balance, self.discount_cents), true),
            }
        } else {
            match self.amount_cents {
                Some(amount) => (amount, false),
                None => (0, true),
            }
        };

        Ok(Reconciliation {
            amount_cents,
            discount_cents: self.discount_cents,
            debt_cents: reconcile(balance, amount_cents, self.discount_cents),
            amount_defaulted,
        })
    }
}

pub fn check_period(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ReconcileError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ReconcileError::InvertedPeriod),
        _ => Ok(()),
    }
}

fn check_non_negative(field: &'static str, value: i64) -> Result<(), ReconcileError> {
    if value < 0 {
        return Err(ReconcileError::Negative(field));
    }
    Ok(())
}

/// Snapshot the client carries after a payment recorded on `today`.
pub fn snapshot_after(
    previous: &ClientSnapshot,
    plan: Plan,
    debt_cents: i64,
    period_to: Option<NaiveDate>,
    today: NaiveDate,
) -> ClientSnapshot {
    ClientSnapshot {
        current_plan: Some(plan.to_string()),
        current_debt_cents: debt_cents.max(0),
        active_until: period_to
            .map(|to| to + Duration::days(ACTIVE_GRACE_DAYS))
            .or(previous.active_until),
        last_payment_date: Some(today),
        next_payment_date: period_to,
    }
}
