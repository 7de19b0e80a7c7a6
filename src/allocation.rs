//! Splits a project budget across a building's apartments.
//!
//! Allocation is a pure function of the project terms and a snapshot of the
//! apartment roster. It does not know whether a project was already allocated;
//! the caller creating the project is responsible for running it once.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::calendar::BillingMonth;
use crate::config::EngineConfig;
use crate::error::{PaymentsError, Result};
use crate::money::{Cents, PERMILLE, pro_rate};
use crate::schedule::schedule_with;

/// Budget and calendar of an extraordinary-payments project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTerms {
    /// Total amount to be collected from the building, in cents.
    pub budget_cents: Cents,
    /// Number of monthly installments each apartment pays.
    pub installment_count: u32,
    /// Month in which the first installment falls due.
    pub start: BillingMonth,
}

impl ProjectTerms {
    pub fn new(budget_cents: Cents, installment_count: u32, start: BillingMonth) -> Self {
        Self {
            budget_cents,
            installment_count,
            start,
        }
    }

    /// Terms using the configured default installment count.
    pub fn with_default_count(
        budget_cents: Cents,
        start: BillingMonth,
        config: &EngineConfig,
    ) -> Self {
        Self::new(budget_cents, config.default_installment_count, start)
    }

    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        if self.budget_cents <= 0 {
            return Err(PaymentsError::InvalidBudget(self.budget_cents));
        }
        config.check_installment_count(self.installment_count)?;
        BillingMonth::new(self.start.year, self.start.month)?;
        Ok(())
    }
}

/// One entry of the roster snapshot taken when a project is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentPermillage {
    /// The apartment this entry belongs to.
    pub apartment_id: Uuid,
    /// Ownership share in parts per thousand of the building.
    pub permillage: Decimal,
}

impl ApartmentPermillage {
    pub fn new(apartment_id: Uuid, permillage: Decimal) -> Self {
        Self {
            apartment_id,
            permillage,
        }
    }
}

/// A single month of an apartment's schedule, before it is written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    /// 1-based position within the schedule.
    pub index: u32,
    /// Month in which the installment falls due.
    pub due: BillingMonth,
    /// Amount owed for this month, in cents.
    pub amount_due_cents: Cents,
}

/// An apartment's share of the budget together with its monthly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentAllocation {
    /// The apartment being charged.
    pub apartment_id: Uuid,
    /// The permillage the share was computed from.
    pub permillage: Decimal,
    /// The apartment's whole share of the budget, in cents.
    pub share_cents: Cents,
    /// Monthly schedule; its amounts add up to `share_cents`.
    pub installments: Vec<ScheduledInstallment>,
}

/// Checks the roster before anything is computed.
///
/// A permillage of exactly zero is accepted and produces an empty share.
pub fn validate_roster(roster: &[ApartmentPermillage]) -> Result<()> {
    let mut seen = HashSet::with_capacity(roster.len());
    for entry in roster {
        if entry.permillage < Decimal::ZERO || entry.permillage > PERMILLE {
            return Err(PaymentsError::InvalidShare(entry.permillage));
        }
        if !seen.insert(entry.apartment_id) {
            return Err(PaymentsError::DuplicateApartment(entry.apartment_id));
        }
    }
    Ok(())
}

/// Allocates with the default [`EngineConfig`].
pub fn allocate(
    terms: &ProjectTerms,
    roster: &[ApartmentPermillage],
) -> Result<Vec<ApartmentAllocation>> {
    allocate_with(terms, roster, &EngineConfig::default())
}

/// Produces the full payment schedule of every apartment in the roster.
///
/// # Errors
///
/// Validation errors for bad terms or roster entries; a consistency error if a
/// schedule does not add back up to its share.
pub fn allocate_with(
    terms: &ProjectTerms,
    roster: &[ApartmentPermillage],
    config: &EngineConfig,
) -> Result<Vec<ApartmentAllocation>> {
    terms.validate(config)?;
    validate_roster(roster)?;

    roster
        .iter()
        .map(|entry| allocate_apartment(terms, entry, config))
        .collect()
}

fn allocate_apartment(
    terms: &ProjectTerms,
    entry: &ApartmentPermillage,
    config: &EngineConfig,
) -> Result<ApartmentAllocation> {
    let share_cents = if entry.permillage.is_zero() {
        0
    } else {
        pro_rate(terms.budget_cents, entry.permillage)?
    };

    let amounts = schedule_with(share_cents, terms.installment_count, config.remainder_policy)?;
    let scheduled: Cents = amounts.iter().sum();
    if scheduled != share_cents {
        error!(
            apartment_id = %entry.apartment_id,
            share_cents,
            scheduled,
            "installment schedule does not add up to the apartment share"
        );
        return Err(PaymentsError::Consistency(format!(
            "schedule for apartment {} sums to {} cents, expected {}",
            entry.apartment_id, scheduled, share_cents
        )));
    }

    debug!(
        apartment_id = %entry.apartment_id,
        permillage = %entry.permillage,
        share_cents,
        installments = amounts.len(),
        "allocated apartment share"
    );

    let installments = (0u32..)
        .zip(amounts)
        .map(|(position, amount_due_cents)| ScheduledInstallment {
            index: position + 1,
            due: terms.start.offset(position),
            amount_due_cents,
        })
        .collect();

    Ok(ApartmentAllocation {
        apartment_id: entry.apartment_id,
        permillage: entry.permillage,
        share_cents,
        installments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RemainderPolicy;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn terms(budget: Cents, count: u32, year: i32, month: u32) -> ProjectTerms {
        ProjectTerms::new(budget, count, BillingMonth::new(year, month).unwrap())
    }

    #[test]
    fn allocates_observed_project() {
        let apartment = Uuid::new_v4();
        let roster = vec![ApartmentPermillage::new(apartment, dec!(16.49))];

        let result = allocate(&terms(4_577_310, 12, 2024, 3), &roster).unwrap();

        assert_eq!(result.len(), 1);
        let allocation = &result[0];
        assert_eq!(allocation.apartment_id, apartment);
        assert_eq!(allocation.share_cents, 75_479);
        assert_eq!(allocation.installments.len(), 12);
        assert_eq!(allocation.installments[0].amount_due_cents, 6_289);
        assert_eq!(allocation.installments[11].amount_due_cents, 6_300);
        assert_eq!(
            allocation
                .installments
                .iter()
                .map(|i| i.amount_due_cents)
                .sum::<Cents>(),
            75_479
        );
    }

    #[test]
    fn due_dates_roll_into_next_year() {
        let roster = vec![ApartmentPermillage::new(Uuid::new_v4(), dec!(100))];
        let result = allocate(&terms(120_000, 4, 2024, 11), &roster).unwrap();
        let dues: Vec<_> = result[0]
            .installments
            .iter()
            .map(|i| (i.index, i.due.year, i.due.month))
            .collect();

        assert_eq!(
            dues,
            vec![(1, 2024, 11), (2, 2024, 12), (3, 2025, 1), (4, 2025, 2)]
        );
    }

    #[test]
    fn empty_roster_is_empty_result() {
        let result = allocate(&terms(100_000, 12, 2024, 1), &[]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn zero_permillage_yields_zero_rows() {
        let roster = vec![ApartmentPermillage::new(Uuid::new_v4(), dec!(0))];
        let result = allocate(&terms(100_000, 6, 2024, 1), &roster).unwrap();

        assert_eq!(result[0].share_cents, 0);
        assert_eq!(result[0].installments.len(), 6);
        assert!(result[0].installments.iter().all(|i| i.amount_due_cents == 0));
    }

    #[test]
    fn shares_stay_within_budget() {
        let permillages = [
            dec!(142.86),
            dec!(142.86),
            dec!(142.86),
            dec!(142.86),
            dec!(142.85),
            dec!(142.85),
            dec!(142.86),
        ];
        let roster: Vec<_> = permillages
            .into_iter()
            .map(|p| ApartmentPermillage::new(Uuid::new_v4(), p))
            .collect();
        let budget = 987_654;

        let result = allocate(&terms(budget, 10, 2024, 1), &roster).unwrap();
        let allocated: Cents = result.iter().map(|a| a.share_cents).sum();

        assert!(allocated <= budget);
        assert!(budget - allocated <= roster.len() as Cents);
    }

    #[test]
    fn spread_policy_is_honored() {
        let config = EngineConfig {
            remainder_policy: RemainderPolicy::Spread,
            ..EngineConfig::default()
        };
        let roster = vec![ApartmentPermillage::new(Uuid::new_v4(), dec!(1000))];
        let result = allocate_with(&terms(100, 3, 2024, 1), &roster, &config).unwrap();
        let amounts: Vec<_> = result[0].installments.iter().map(|i| i.amount_due_cents).collect();
        assert_eq!(amounts, vec![34, 33, 33]);
    }

    #[rstest]
    #[case(0, 12)]
    #[case(-100, 12)]
    fn non_positive_budget_is_rejected(#[case] budget: Cents, #[case] count: u32) {
        let err = allocate(&terms(budget, count, 2024, 1), &[]).unwrap_err();
        assert!(matches!(err, PaymentsError::InvalidBudget(b) if b == budget));
    }

    #[rstest]
    #[case(0)]
    #[case(37)]
    fn installment_count_outside_range_is_rejected(#[case] count: u32) {
        let err = allocate(&terms(10_000, count, 2024, 1), &[]).unwrap_err();
        assert!(matches!(
            err,
            PaymentsError::InvalidInstallmentCount { count: c, max: 36 } if c == count
        ));
    }

    #[test]
    fn bad_roster_entries_are_rejected() {
        let apartment = Uuid::new_v4();
        let duplicate = vec![
            ApartmentPermillage::new(apartment, dec!(10)),
            ApartmentPermillage::new(apartment, dec!(20)),
        ];
        assert!(matches!(
            allocate(&terms(10_000, 12, 2024, 1), &duplicate),
            Err(PaymentsError::DuplicateApartment(id)) if id == apartment
        ));

        let too_large = vec![ApartmentPermillage::new(Uuid::new_v4(), dec!(1000.5))];
        assert!(matches!(
            allocate(&terms(10_000, 12, 2024, 1), &too_large),
            Err(PaymentsError::InvalidShare(_))
        ));
    }

    #[test]
    fn unvalidated_start_month_is_rejected() {
        let bad = ProjectTerms::new(10_000, 12, BillingMonth { year: 2024, month: 13 });
        assert!(matches!(
            allocate(&bad, &[]),
            Err(PaymentsError::InvalidMonth(13))
        ));
    }
}
