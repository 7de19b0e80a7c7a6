//! `condo_payments` splits the budget of a condominium's extraordinary-payments
//! project across its apartments and keeps the ledger of what each apartment has paid.
//!
//! It covers the whole path from a manager's project to a resident's balance:
//! - **Allocation**: each apartment owes `floor(budget × permillage / 1000)` cents,
//!   split into monthly installments whose remainder lands on the last one.
//! - **Ledger**: installments accumulate partial payments, managers can force a
//!   range of months to paid or pending, and projects can be archived or deleted.
//! - **Summaries**: balance and overdue figures per apartment, building or project,
//!   always recomputed from the current rows.
//!
//! All money is integer cents; permillages are exact decimals.
//!
//! ## Usage
//!
//! Add `condo_payments` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! condo_payments = "0.1.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then create a project on a [`Ledger`] and query it:
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use condo_payments::{
//!     ApartmentPermillage, BillingMonth, Ledger, ProjectTerms, SummaryScope,
//! };
//! use rust_decimal_macros::dec;
//! use uuid::Uuid;
//!
//! fn main() -> Result<(), condo_payments::PaymentsError> {
//!     let ledger = Ledger::new();
//!     let apartment = Uuid::new_v4();
//!
//!     let project = ledger.create_project(
//!         Uuid::new_v4(),
//!         "Elevator replacement",
//!         ProjectTerms::new(4_577_310, 12, BillingMonth::new(2024, 1)?),
//!         vec![ApartmentPermillage::new(apartment, dec!(16.49))],
//!     )?;
//!
//!     let schedule = ledger.installments_for(project.id, apartment)?;
//!     assert_eq!(schedule[0].amount_due_cents, 6_289);
//!     assert_eq!(schedule[11].amount_due_cents, 6_300);
//!
//!     ledger.record_payment(schedule[0].id, 6_289, Utc::now())?;
//!
//!     let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
//!     let summary = ledger.status_summary(SummaryScope::Apartment(apartment), as_of)?;
//!     println!("Balance:  {} cents", summary.balance_cents);
//!     println!("Overdue:  {}", summary.overdue_count);
//!     assert_eq!(summary.overdue_count, 1);
//!     Ok(())
//! }
//! ```

pub mod allocation;
pub mod calendar;
pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod money;
pub mod schedule;
pub mod status;
pub mod summary;
pub mod telemetry;

pub use allocation::{
    ApartmentAllocation, ApartmentPermillage, ProjectTerms, ScheduledInstallment, allocate,
    allocate_with,
};
pub use calendar::{BillingMonth, MonthRange};
pub use config::EngineConfig;
pub use error::{ErrorKind, PaymentsError, Result};
pub use ledger::Ledger;
pub use model::{
    ApartmentShare, Installment, PaymentEvent, PaymentEventKind, Project, ProjectStatus,
};
pub use money::{Cents, pro_rate};
pub use schedule::{RemainderPolicy, schedule, schedule_with};
pub use status::{InstallmentStatus, classify, derive_status};
pub use summary::{PaymentStatusSummary, SummaryScope, summarize};
pub use telemetry::init_tracing;
