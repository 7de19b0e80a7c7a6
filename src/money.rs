//! Integer-cents arithmetic and permillage proration.
//!
//! Every amount in this crate is an `i64` number of cents. Permillages are exact
//! decimals, so `16.49‰` never goes through a float. The one rounding rule used
//! anywhere money is split is **floor**: fractional cents are dropped. Because
//! each apartment loses strictly less than one cent, the shares of a roster never
//! add up to more than the budget.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{PaymentsError, Result};

/// Amount of money in minor units.
pub type Cents = i64;

/// Parts per thousand of a building.
pub const PERMILLE: Decimal = Decimal::ONE_THOUSAND;

/// Checks that a permillage lies in `(0, 1000]`.
pub fn validate_permillage(permillage: Decimal) -> Result<()> {
    if permillage <= Decimal::ZERO || permillage > PERMILLE {
        return Err(PaymentsError::InvalidShare(permillage));
    }
    Ok(())
}

/// Computes `floor(total_cents * permillage / 1000)`.
///
/// # Errors
///
/// Returns [`PaymentsError::InvalidShare`] if the permillage is not in `(0, 1000]`
/// and [`PaymentsError::InvalidBudget`] if `total_cents` is negative.
pub fn pro_rate(total_cents: Cents, permillage: Decimal) -> Result<Cents> {
    if total_cents < 0 {
        return Err(PaymentsError::InvalidBudget(total_cents));
    }
    validate_permillage(permillage)?;

    let share = (Decimal::from(total_cents) * permillage / PERMILLE)
        .round_dp_with_strategy(0, RoundingStrategy::ToZero);

    share.to_i64().ok_or_else(|| {
        PaymentsError::Consistency(format!(
            "share of {total_cents} cents at {permillage} permille does not fit in cents"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn pro_rate_matches_observed_project_share() {
        // 4_577_310 * 16.49 / 1000 = 75_479.84
        assert_eq!(pro_rate(4_577_310, dec!(16.49)).unwrap(), 75_479);
    }

    #[rstest]
    #[case(1_000, dec!(1000), 1_000)]
    #[case(1_000, dec!(500), 500)]
    #[case(999, dec!(0.5), 0)]
    #[case(10_000, dec!(333.333), 3_333)]
    #[case(0, dec!(250), 0)]
    fn pro_rate_floors_fractional_cents(
        #[case] total: Cents,
        #[case] permillage: Decimal,
        #[case] expected: Cents,
    ) {
        assert_eq!(pro_rate(total, permillage).unwrap(), expected);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    #[case(dec!(1000.01))]
    fn pro_rate_rejects_out_of_range_permillage(#[case] permillage: Decimal) {
        let err = pro_rate(1_000, permillage).unwrap_err();
        assert!(matches!(err, PaymentsError::InvalidShare(p) if p == permillage));
    }

    #[test]
    fn pro_rate_rejects_negative_totals() {
        assert!(matches!(
            pro_rate(-5, dec!(10)),
            Err(PaymentsError::InvalidBudget(-5))
        ));
    }

    #[test]
    fn roster_shares_never_exceed_budget() {
        let budget = 1_234_567;
        let roster = [dec!(333.33), dec!(333.33), dec!(333.34)];
        let total: Cents = roster
            .iter()
            .map(|p| pro_rate(budget, *p).unwrap())
            .sum();

        assert!(total <= budget);
        assert!(budget - total <= roster.len() as Cents);
    }
}
