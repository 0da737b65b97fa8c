use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::domain::{
    billing::reconciler::ACTIVE_GRACE_DAYS,
    entities::{client::ClientSnapshot, payment::Payment},
};

/// Billing status of a client as derived from its payment history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatus {
    pub current_plan: Option<String>,
    pub current_debt_cents: i64,
    pub paid_this_month_cents: i64,
    pub next_due: Option<NaiveDate>,
    pub is_month_fully_paid: bool,
}

/// The most recent payment. Equal creation timestamps fall back to `seq`.
pub fn latest_payment(payments: &[Payment]) -> Option<&Payment> {
    payments.iter().max_by_key(|p| (p.created_at, p.seq))
}

/// Sort newest first, the order history is shown in.
pub fn sort_newest_first(payments: &mut [Payment]) {
    payments.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
}

/// Derive a client's status from its payments.
///
/// "This month" is the calendar month of `now` in `now`'s own timezone,
/// so callers decide which local calendar the gym runs on.
pub fn project<Tz: TimeZone>(payments: &[Payment], now: &DateTime<Tz>) -> ClientStatus {
    let latest = latest_payment(payments);

    let paid_this_month_cents = payments
        .iter()
        .filter(|p| {
            let local = p.created_at.with_timezone(&now.timezone());
            local.year() == now.year() && local.month() == now.month()
        })
        .map(|p| p.amount_cents)
        .sum::<i64>();

    let current_plan = latest.map(|p| p.plan.clone());
    let current_debt_cents = latest.map(|p| p.debt_cents.max(0)).unwrap_or(0);
    let next_due = latest.and_then(Payment::due_date);

    ClientStatus {
        current_plan,
        current_debt_cents,
        paid_this_month_cents,
        next_due,
        is_month_fully_paid: paid_this_month_cents > 0 && current_debt_cents <= 0,
    }
}

/// Rebuild the cached snapshot from history. With no payments the client
/// has never been billed and the snapshot is empty.
pub fn rebuild_snapshot<Tz: TimeZone>(payments: &[Payment], tz: &Tz) -> ClientSnapshot {
    let Some(latest) = latest_payment(payments) else {
        return ClientSnapshot::default();
    };

    // active_until only moves when a payment covers a period.
    let active_until = payments
        .iter()
        .filter(|p| p.period_to.is_some())
        .max_by_key(|p| (p.created_at, p.seq))
        .and_then(|p| p.period_to)
        .map(|to| to + Duration::days(ACTIVE_GRACE_DAYS));

    ClientSnapshot {
        current_plan: Some(latest.plan.clone()),
        current_debt_cents: latest.debt_cents.max(0),
        active_until,
        last_payment_date: Some(latest.created_at.with_timezone(tz).date_naive()),
        next_payment_date: latest.period_to,
    }
}

/// Whether the stored snapshot disagrees with what history says about the
/// fields the roster reads: plan, debt and next due date.
pub fn snapshot_drifted(stored: &ClientSnapshot, rebuilt: &ClientSnapshot) -> bool {
    stored.current_plan != rebuilt.current_plan
        || stored.current_debt_cents != rebuilt.current_debt_cents
        || stored.next_payment_date != rebuilt.next_payment_date
}
