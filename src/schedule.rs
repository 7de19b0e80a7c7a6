use serde::{Deserialize, Serialize};

use crate::error::{PaymentsError, Result};
use crate::money::Cents;

/// Upper bound on installments accepted when no configuration says otherwise.
pub const MAX_INSTALLMENTS: u32 = 36;

/// Where the cents left over by an even split end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// The whole remainder is added to the final installment.
    #[default]
    Last,
    /// The first `remainder` installments each carry one extra cent.
    Spread,
}

/// Splits a share into `count` monthly amounts using [`RemainderPolicy::Last`].
///
/// `floor(share / count)` is paid every month and whatever is left is added to the
/// last installment, so the amounts always add back up to `share_cents`.
///
/// # Errors
///
/// Returns an error if `count` is outside `1..=MAX_INSTALLMENTS` or `share_cents` is
/// negative.
pub fn schedule(share_cents: Cents, count: u32) -> Result<Vec<Cents>> {
    schedule_with(share_cents, count, RemainderPolicy::Last)
}

/// Splits a share into `count` monthly amounts with an explicit remainder policy.
pub fn schedule_with(
    share_cents: Cents,
    count: u32,
    policy: RemainderPolicy,
) -> Result<Vec<Cents>> {
    if count == 0 || count > MAX_INSTALLMENTS {
        return Err(PaymentsError::InvalidInstallmentCount {
            count,
            max: MAX_INSTALLMENTS,
        });
    }
    if share_cents < 0 {
        return Err(PaymentsError::InvalidBudget(share_cents));
    }

    let n = Cents::from(count);
    let base = share_cents / n;
    let remainder = share_cents - base * n;

    let mut amounts = vec![base; count as usize];
    match policy {
        RemainderPolicy::Last => {
            if let Some(last) = amounts.last_mut() {
                *last += remainder;
            }
        }
        RemainderPolicy::Spread => {
            for amount in amounts.iter_mut().take(remainder as usize) {
                *amount += 1;
            }
        }
    }

    Ok(amounts)
}
