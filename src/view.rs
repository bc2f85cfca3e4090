use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::amortization::ScheduledInstallment;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::loan::Loan;
use crate::types::{LoanId, LoanStatus};

/// read-only view of a loan for the participant dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub id: LoanId,
    pub participant_id: String,
    pub status: LoanStatus,
    pub currency: String,
    pub amounts: AmountsView,
    pub progress: ProgressView,
    pub dates: DatesView,
    pub schedule: Vec<ScheduledInstallment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountsView {
    pub principal_amount: Money,
    pub interest_rate: Rate,
    pub total_interest: Money,
    pub total_amount: Money,
    pub installment_amount: Money,
    pub amount_paid: Money,
    pub remaining_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub total_installments: u32,
    pub paid_installments: u32,
    pub remaining_installments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatesView {
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub next_due_date: Option<NaiveDate>,
    pub last_payment_date: Option<DateTime<Utc>>,
}

impl LoanView {
    pub fn from_loan(loan: &Loan, currency: &str) -> Result<Self> {
        Ok(LoanView {
            id: loan.id(),
            participant_id: loan.participant_id().to_string(),
            status: loan.status(),
            currency: currency.to_string(),
            amounts: AmountsView {
                principal_amount: loan.principal_amount(),
                interest_rate: loan.interest_rate(),
                total_interest: loan.total_interest(),
                total_amount: loan.total_amount(),
                installment_amount: loan.installment_amount(),
                amount_paid: loan.amount_paid(),
                remaining_amount: loan.remaining_amount(),
            },
            progress: ProgressView {
                total_installments: loan.total_installments(),
                paid_installments: loan.paid_installments(),
                remaining_installments: loan.remaining_installments(),
            },
            dates: DatesView {
                start_date: loan.start_date(),
                due_date: loan.due_date(),
                next_due_date: loan.next_due_date()?,
                last_payment_date: loan.last_payment_date(),
            },
            schedule: loan.schedule()?,
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
