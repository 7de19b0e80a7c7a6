use std::result::Result as StdResult;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::money::Cents;

/// Broad classes callers branch on when an operation is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed; nothing was persisted.
    Validation,
    /// The request references a row that does not exist (or no longer exists).
    NotFound,
    /// The request is well-formed but the current state of the project forbids it.
    Conflict,
    /// An internal invariant broke. Never retried.
    Consistency,
}

#[derive(Debug, Error)]
pub enum PaymentsError {
    #[error("Invalid share: permillage {0} must be greater than 0 and at most 1000")]
    InvalidShare(Decimal),
    #[error("Invalid installment count: {count} (allowed 1..={max})")]
    InvalidInstallmentCount { count: u32, max: u32 },
    #[error("Invalid budget: {0} cents (must be positive)")]
    InvalidBudget(Cents),
    #[error("Invalid month: {0} (must be between 1 and 12)")]
    InvalidMonth(u32),
    #[error("Invalid payment amount: {0} cents (must not be negative)")]
    InvalidAmount(Cents),
    #[error("Apartment {0} appears more than once in the roster")]
    DuplicateApartment(Uuid),
    #[error("Invalid status override: {0}")]
    InvalidStatusOverride(String),
    #[error("Installment not found: {0}")]
    InstallmentNotFound(Uuid),
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),
    #[error("Apartment {apartment_id} has no installments in project {project_id}")]
    ApartmentNotFound { apartment_id: Uuid, project_id: Uuid },
    #[error("Project {0} already has recorded payments; budget and installments are locked")]
    ProjectLocked(Uuid),
    #[error("Project {0} is not active")]
    ProjectInactive(Uuid),
    #[error("Consistency violation: {0}")]
    Consistency(String),
    #[error("Ledger lock poisoned")]
    LockPoisoned,
}

impl PaymentsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentsError::InvalidShare(_)
            | PaymentsError::InvalidInstallmentCount { .. }
            | PaymentsError::InvalidBudget(_)
            | PaymentsError::InvalidMonth(_)
            | PaymentsError::InvalidAmount(_)
            | PaymentsError::DuplicateApartment(_)
            | PaymentsError::InvalidStatusOverride(_) => ErrorKind::Validation,
            PaymentsError::InstallmentNotFound(_)
            | PaymentsError::ProjectNotFound(_)
            | PaymentsError::ApartmentNotFound { .. } => ErrorKind::NotFound,
            PaymentsError::ProjectLocked(_) | PaymentsError::ProjectInactive(_) => {
                ErrorKind::Conflict
            }
            PaymentsError::Consistency(_) | PaymentsError::LockPoisoned => ErrorKind::Consistency,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl<T> From<std::sync::PoisonError<T>> for PaymentsError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        PaymentsError::LockPoisoned
    }
}

pub type Result<T> = StdResult<T, PaymentsError>;
