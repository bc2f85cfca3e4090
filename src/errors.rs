use thiserror::Error;

use crate::types::LoanId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        message: String,
    },

    #[error("loan {loan_id} already paid: all {total_installments} installments recorded")]
    AlreadyPaid {
        loan_id: LoanId,
        total_installments: u32,
    },

    #[error("concurrent modification of loan {loan_id}: expected version {expected}, found {found}")]
    ConcurrentModification {
        loan_id: LoanId,
        expected: u64,
        found: u64,
    },

    #[error("loan not found: {loan_id}")]
    LoanNotFound {
        loan_id: LoanId,
    },

    #[error("loan already exists: {loan_id}")]
    DuplicateLoan {
        loan_id: LoanId,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("loan store unavailable: {message}")]
    StoreUnavailable {
        message: String,
    },
}

impl LoanError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LoanError::InvalidParameter {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
