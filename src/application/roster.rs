use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::domain::{billing::projector::ClientStatus, entities::client::Client};

/// A client as the roster shows it: stored fields plus projected status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    #[serde(flatten)]
    pub status: ClientStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RosterStatus {
    #[default]
    Active,
    Inactive,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Plan,
    Paid,
    Debt,
    Due,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RosterQuery {
    pub status: RosterStatus,
    pub search: Option<String>,
    pub sort: SortKey,
    pub dir: SortDir,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total_clients: usize,
    pub clients_with_debt: usize,
    pub monthly_income_cents: i64,
}

/// Filter and sort the roster. Sorting is stable, so ties keep
/// registration order.
pub fn apply(views: Vec<ClientView>, query: &RosterQuery, today: NaiveDate) -> Vec<ClientView> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut out: Vec<ClientView> = views
        .into_iter()
        .filter(|v| match query.status {
            RosterStatus::Active => v.client.is_active_on(today),
            RosterStatus::Inactive => !v.client.is_active_on(today),
            RosterStatus::All => true,
        })
        .filter(|v| needle.as_deref().is_none_or(|n| matches_search(&v.client, n)))
        .collect();

    out.sort_by(|a, b| {
        let ord = compare(a, b, query.sort);
        match query.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
    out
}

pub fn stats(views: &[ClientView]) -> RosterStats {
    RosterStats {
        total_clients: views.len(),
        clients_with_debt: views
            .iter()
            .filter(|v| v.status.current_debt_cents > 0)
            .count(),
        monthly_income_cents: views.iter().map(|v| v.status.paid_this_month_cents).sum(),
    }
}

fn matches_search(client: &Client, needle: &str) -> bool {
    [
        Some(client.name.as_str()),
        client.email.as_deref(),
        client.phone.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

fn compare(a: &ClientView, b: &ClientView, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.client.name.to_lowercase().cmp(&b.client.name.to_lowercase()),
        SortKey::Plan => a
            .status
            .current_plan
            .as_deref()
            .unwrap_or("")
            .cmp(b.status.current_plan.as_deref().unwrap_or("")),
        SortKey::Paid => a.status.is_month_fully_paid.cmp(&b.status.is_month_fully_paid),
        SortKey::Debt => a.status.current_debt_cents.cmp(&b.status.current_debt_cents),
        // No due date sorts after every real date.
        SortKey::Due => match (a.status.next_due, b.status.next_due) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
