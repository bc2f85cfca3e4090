use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amortization::{compute_installment, installment_due_date, InstallmentQuote};
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// loan terms as entered by an administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal_amount: Money,
    pub interest_rate: Rate,
    pub total_installments: u32,
    pub start_date: NaiveDate,
    /// defaults to `start_date` plus one month per installment
    pub due_date: Option<NaiveDate>,
}

impl LoanTerms {
    pub fn new(
        principal_amount: Money,
        interest_rate: Rate,
        total_installments: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            principal_amount,
            interest_rate,
            total_installments,
            start_date,
            due_date: None,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// installment and total for these terms
    pub fn quote(&self) -> Result<InstallmentQuote> {
        compute_installment(self.principal_amount, self.interest_rate, self.total_installments)
    }

    /// explicit due date, or the date of the last scheduled installment
    ///
    /// An explicit due date may not fall before the last installment.
    pub fn resolved_due_date(&self) -> Result<NaiveDate> {
        let last_installment = installment_due_date(self.start_date, self.total_installments)?;

        match self.due_date {
            Some(due_date) if due_date < last_installment => Err(LoanError::InvalidDate {
                message: format!(
                    "due date {} is before the last installment on {}",
                    due_date, last_installment
                ),
            }),
            Some(due_date) => Ok(due_date),
            None => Ok(last_installment),
        }
    }

    /// validate and price the terms in one step
    pub fn validate(&self) -> Result<(InstallmentQuote, NaiveDate)> {
        let quote = self.quote()?;
        let due_date = self.resolved_due_date()?;
        Ok((quote, due_date))
    }

    /// apply an edit, returning the new terms
    pub fn merge(&self, edit: &TermsEdit) -> LoanTerms {
        // a new start date without an explicit due date drops the old one
        let due_date = match (edit.due_date, edit.start_date) {
            (Some(date), _) => Some(date),
            (None, Some(_)) => None,
            (None, None) => self.due_date,
        };

        LoanTerms {
            principal_amount: edit.principal_amount.unwrap_or(self.principal_amount),
            interest_rate: edit.interest_rate.unwrap_or(self.interest_rate),
            total_installments: edit.total_installments.unwrap_or(self.total_installments),
            start_date: edit.start_date.unwrap_or(self.start_date),
            due_date,
        }
    }
}

/// administrative edit; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsEdit {
    pub principal_amount: Option<Money>,
    pub interest_rate: Option<Rate>,
    pub total_installments: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl TermsEdit {
    pub fn is_empty(&self) -> bool {
        self == &TermsEdit::default()
    }

    pub fn principal(mut self, amount: Money) -> Self {
        self.principal_amount = Some(amount);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    pub fn installments(mut self, count: u32) -> Self {
        self.total_installments = Some(count);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

/// loan service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// read-modify-write retries after a version collision
    pub max_write_retries: u32,
    /// currency label used in log lines and views
    pub currency: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_write_retries: 1,
            currency: "INR".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
