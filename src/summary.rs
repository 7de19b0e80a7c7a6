//! Balance and overdue read-model, recomputed from ledger rows on every read.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::calendar::BillingMonth;
use crate::error::{PaymentsError, Result};
use crate::model::{Installment, Project};
use crate::money::Cents;
use crate::status::InstallmentStatus;

/// What a summary is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum SummaryScope {
    Apartment(Uuid),
    Building(Uuid),
    Project(Uuid),
}

/// Figures shown to residents and managers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusSummary {
    /// Still owed on installments due up to and including the as-of month.
    pub balance_cents: Cents,
    /// Unpaid installments whose due month has fully elapsed.
    pub overdue_count: u32,
    pub active_project_count: u32,
    /// Still owed across every installment, future months included.
    pub outstanding_cents: Cents,
}

/// Aggregates rows of active projects within `scope` as seen at `as_of`.
///
/// # Errors
///
/// Returns [`PaymentsError::Consistency`] if a total does not fit in cents.
pub fn summarize<'a>(
    projects: impl IntoIterator<Item = &'a Project>,
    rows: impl IntoIterator<Item = &'a Installment>,
    scope: SummaryScope,
    as_of: &DateTime<Utc>,
) -> Result<PaymentStatusSummary> {
    let in_scope: HashSet<Uuid> = projects
        .into_iter()
        .filter(|project| project.is_active())
        .filter(|project| match scope {
            SummaryScope::Apartment(_) => true,
            SummaryScope::Building(building_id) => project.building_id == building_id,
            SummaryScope::Project(project_id) => project.id == project_id,
        })
        .map(|project| project.id)
        .collect();

    let as_of_month = BillingMonth::of(as_of);
    let mut summary = PaymentStatusSummary::default();
    let mut touched = HashSet::new();

    for row in rows {
        if !in_scope.contains(&row.project_id) {
            continue;
        }
        if let SummaryScope::Apartment(apartment_id) = scope {
            if row.apartment_id != apartment_id {
                continue;
            }
        }
        touched.insert(row.project_id);

        let owed = row.outstanding_cents();
        summary.outstanding_cents = add_cents(summary.outstanding_cents, owed)?;
        if row.due <= as_of_month {
            summary.balance_cents = add_cents(summary.balance_cents, owed)?;
        }
        if row.status_at(as_of) == InstallmentStatus::Late {
            summary.overdue_count += 1;
        }
    }

    summary.active_project_count = match scope {
        SummaryScope::Apartment(_) => touched.len() as u32,
        _ => in_scope.len() as u32,
    };
    Ok(summary)
}

fn add_cents(total: Cents, owed: Cents) -> Result<Cents> {
    total.checked_add(owed).ok_or_else(|| {
        error!(total, owed, "summary total does not fit in cents");
        PaymentsError::Consistency(format!(
            "summary total overflowed adding {owed} cents to {total}"
        ))
    })
}
