use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::BillingMonth;
use crate::money::Cents;

/// Payment state of one installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    Late,
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Partial => "partial",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Late => "late",
        };
        f.write_str(label)
    }
}

/// Status from amounts alone. Never returns [`InstallmentStatus::Late`].
///
/// A zero-amount installment is paid from the start, and overpayment is still paid.
pub fn derive_status(amount_due_cents: Cents, amount_paid_cents: Cents) -> InstallmentStatus {
    if amount_paid_cents >= amount_due_cents {
        InstallmentStatus::Paid
    } else if amount_paid_cents > 0 {
        InstallmentStatus::Partial
    } else {
        InstallmentStatus::Pending
    }
}

/// Status as seen at `as_of`: an unpaid installment turns late once its due month
/// has fully elapsed. Partial payments do not stop it from being late.
pub fn classify(
    amount_due_cents: Cents,
    amount_paid_cents: Cents,
    due: BillingMonth,
    as_of: &DateTime<Utc>,
) -> InstallmentStatus {
    match derive_status(amount_due_cents, amount_paid_cents) {
        InstallmentStatus::Paid => InstallmentStatus::Paid,
        _ if due.has_elapsed(as_of) => InstallmentStatus::Late,
        open => open,
    }
}
