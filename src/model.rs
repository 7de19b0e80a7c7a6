//! Rows held by the [`Ledger`](crate::ledger::Ledger).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocation::{
    ApartmentAllocation, ApartmentPermillage, ProjectTerms, ScheduledInstallment,
};
use crate::calendar::BillingMonth;
use crate::error::{PaymentsError, Result};
use crate::money::Cents;
use crate::status::{InstallmentStatus, classify, derive_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
    Deleted,
}

/// An apartment's portion of a project budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentShare {
    /// The apartment being charged.
    pub apartment_id: Uuid,
    /// The project the share belongs to.
    pub project_id: Uuid,
    /// Permillage taken from the roster snapshot.
    pub permillage: Decimal,
    /// `floor(budget × permillage / 1000)`, in cents.
    pub total_share_cents: Cents,
}

impl ApartmentShare {
    pub(crate) fn from_allocations(
        project_id: Uuid,
        allocations: &[ApartmentAllocation],
    ) -> Vec<Self> {
        allocations
            .iter()
            .map(|allocation| Self {
                apartment_id: allocation.apartment_id,
                project_id,
                permillage: allocation.permillage,
                total_share_cents: allocation.share_cents,
            })
            .collect()
    }
}

/// An extraordinary-payments project.
///
/// `roster` is the apartment snapshot taken at creation; later changes to the
/// building never reach an existing project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier of the project.
    pub id: Uuid,
    /// The building whose apartments pay for it.
    pub building_id: Uuid,
    /// Display name chosen by the manager.
    pub name: String,
    /// Budget, installment count and start month.
    pub terms: ProjectTerms,
    /// Apartments and permillages at creation time.
    pub roster: Vec<ApartmentPermillage>,
    /// Each apartment's share of the budget.
    pub shares: Vec<ApartmentShare>,
    /// Whether the project is active, archived or deleted.
    pub status: ProjectStatus,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    pub fn share_of(&self, apartment_id: Uuid) -> Option<&ApartmentShare> {
        self.shares.iter().find(|share| share.apartment_id == apartment_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentEventKind {
    /// Money received from the resident.
    Payment,
    /// Manager correction; `amount_cents` is the change applied to the paid amount.
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Payment or manager override.
    pub kind: PaymentEventKind,
    /// Amount added to the paid total; negative for overrides that clear it.
    pub amount_cents: Cents,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// One month of one apartment's obligation within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Unique identifier of the installment.
    pub id: Uuid,
    /// The project the installment belongs to.
    pub project_id: Uuid,
    /// The apartment that owes it.
    pub apartment_id: Uuid,
    /// 1-based position within the apartment's schedule.
    pub index: u32,
    /// Month in which the installment falls due.
    pub due: BillingMonth,
    /// Amount owed, in cents.
    pub amount_due_cents: Cents,
    /// Amount received so far, in cents. May exceed the amount due.
    pub amount_paid_cents: Cents,
    /// Derived from the amounts after every change; see [`derive_status`].
    ///
    /// This is never [`InstallmentStatus::Late`]: lateness depends on the date
    /// it is looked at, so an overdue row still reads `pending` or `partial`
    /// here. Use [`Installment::status_at`] for the status at a given moment.
    pub status: InstallmentStatus,
    /// Every payment and override applied, oldest first.
    pub history: Vec<PaymentEvent>,
}

impl Installment {
    pub(crate) fn from_schedule(
        project_id: Uuid,
        apartment_id: Uuid,
        scheduled: &ScheduledInstallment,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            apartment_id,
            index: scheduled.index,
            due: scheduled.due,
            amount_due_cents: scheduled.amount_due_cents,
            amount_paid_cents: 0,
            status: derive_status(scheduled.amount_due_cents, 0),
            history: Vec::new(),
        }
    }

    /// Status including the time-dependent late classification.
    pub fn status_at(&self, as_of: &DateTime<Utc>) -> InstallmentStatus {
        classify(self.amount_due_cents, self.amount_paid_cents, self.due, as_of)
    }

    /// What is still owed. Overpayment counts as zero, not as credit.
    pub fn outstanding_cents(&self) -> Cents {
        (self.amount_due_cents - self.amount_paid_cents).max(0)
    }

    pub(crate) fn apply_payment(&mut self, amount_cents: Cents, at: DateTime<Utc>) -> Result<()> {
        self.amount_paid_cents = self
            .amount_paid_cents
            .checked_add(amount_cents)
            .ok_or_else(|| {
                PaymentsError::Consistency(format!(
                    "paid amount of installment {} overflowed",
                    self.id
                ))
            })?;
        self.history.push(PaymentEvent {
            kind: PaymentEventKind::Payment,
            amount_cents,
            recorded_at: at,
        });
        self.status = derive_status(self.amount_due_cents, self.amount_paid_cents);
        Ok(())
    }

    /// Forces the paid amount to either nothing or exactly the amount due.
    pub(crate) fn apply_override(&mut self, settled: bool, at: DateTime<Utc>) {
        let target = if settled { self.amount_due_cents } else { 0 };
        let delta = target - self.amount_paid_cents;
        self.amount_paid_cents = target;
        self.history.push(PaymentEvent {
            kind: PaymentEventKind::Override,
            amount_cents: delta,
            recorded_at: at,
        });
        self.status = derive_status(self.amount_due_cents, self.amount_paid_cents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn installment(due_cents: Cents) -> Installment {
        Installment::from_schedule(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &ScheduledInstallment {
                index: 1,
                due: BillingMonth::new(2024, 3).unwrap(),
                amount_due_cents: due_cents,
            },
        )
    }

    #[test]
    fn payments_accumulate_and_reclassify() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let mut row = installment(6_289);
        assert_eq!(row.status, InstallmentStatus::Pending);

        row.apply_payment(2_000, at).unwrap();
        assert_eq!(row.status, InstallmentStatus::Partial);
        assert_eq!(row.outstanding_cents(), 4_289);

        row.apply_payment(5_000, at).unwrap();
        assert_eq!(row.status, InstallmentStatus::Paid);
        assert_eq!(row.amount_paid_cents, 7_000);
        assert_eq!(row.outstanding_cents(), 0);
        assert_eq!(row.history.len(), 2);
    }

    #[test]
    fn override_records_the_correction() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut row = installment(1_000);
        row.apply_payment(300, at).unwrap();

        row.apply_override(true, at);
        assert_eq!(row.amount_paid_cents, 1_000);
        assert_eq!(row.history.last().unwrap().amount_cents, 700);

        row.apply_override(false, at);
        assert_eq!(row.amount_paid_cents, 0);
        assert_eq!(row.status, InstallmentStatus::Pending);
        assert_eq!(row.history.last().unwrap().kind, PaymentEventKind::Override);
    }

    #[test]
    fn stored_status_stays_partial_after_the_due_month() {
        let paid_at = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut row = installment(1_000);
        row.apply_payment(400, paid_at).unwrap();

        assert_eq!(row.status, InstallmentStatus::Partial);
        assert_eq!(row.status_at(&paid_at), InstallmentStatus::Partial);
        assert_eq!(row.status_at(&later), InstallmentStatus::Late);
    }

    #[test]
    fn zero_amount_rows_start_paid() {
        assert_eq!(installment(0).status, InstallmentStatus::Paid);
    }
}
