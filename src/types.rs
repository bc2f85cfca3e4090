use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// identifier of the fund participant a loan is made to
pub type ParticipantId = String;

/// loan repayment status, derived from installment progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoanStatus {
    /// no installment paid yet
    #[default]
    Pending,
    /// some but not all installments paid
    PartiallyPaid,
    /// every installment paid
    Paid,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Paid)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoanStatus::Pending => "pending",
            LoanStatus::PartiallyPaid => "partially paid",
            LoanStatus::Paid => "paid",
        };
        f.write_str(label)
    }
}
