pub mod schedule;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::types::LoanStatus;

pub use schedule::{amortization_schedule, installment_due_date, ScheduledInstallment};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// longest accepted term, fifty years of monthly installments
pub const MAX_INSTALLMENTS: u32 = 600;

/// amounts fixed when a loan is created or its terms are edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentQuote {
    pub installment_amount: Money,
    pub total_amount: Money,
    pub total_interest: Money,
}

/// compute the fixed installment and the total repayable
///
/// Simple interest, prorated over `total_installments / 12` years and
/// spread evenly across the installments. Pure and deterministic.
pub fn compute_installment(
    principal: Money,
    annual_rate: Rate,
    total_installments: u32,
) -> Result<InstallmentQuote> {
    if !principal.is_positive() {
        return Err(LoanError::invalid(format!(
            "principal must be positive, got {}",
            principal
        )));
    }
    if annual_rate.is_negative() {
        return Err(LoanError::invalid(format!(
            "interest rate must not be negative, got {}",
            annual_rate
        )));
    }
    if total_installments == 0 {
        return Err(LoanError::invalid("total installments must be at least 1"));
    }
    if total_installments > MAX_INSTALLMENTS {
        return Err(LoanError::invalid(format!(
            "total installments must be at most {}, got {}",
            MAX_INSTALLMENTS, total_installments
        )));
    }

    let overflow = || {
        LoanError::invalid(format!("loan amounts overflow for principal {}", principal))
    };

    let term_years = Decimal::from(total_installments) / MONTHS_PER_YEAR;
    let interest_factor = annual_rate
        .as_decimal()
        .checked_mul(term_years)
        .ok_or_else(overflow)?;
    let total_interest = principal.checked_mul(interest_factor).ok_or_else(overflow)?;
    let total_amount = principal.checked_add(total_interest).ok_or_else(overflow)?;
    let installment_amount = total_amount
        .checked_div(Decimal::from(total_installments))
        .ok_or_else(overflow)?
        .round_currency();
    // remaining amounts are installment multiples and must stay representable
    installment_amount
        .checked_times(total_installments)
        .ok_or_else(overflow)?;

    Ok(InstallmentQuote {
        installment_amount,
        total_amount,
        total_interest,
    })
}

/// status as a function of installment progress; total over all inputs
pub fn derive_status(paid_installments: u32, total_installments: u32) -> LoanStatus {
    if paid_installments == 0 {
        LoanStatus::Pending
    } else if paid_installments >= total_installments {
        LoanStatus::Paid
    } else {
        LoanStatus::PartiallyPaid
    }
}

/// amount still owed after `paid_installments` payments
pub fn compute_remaining(
    installment_amount: Money,
    total_installments: u32,
    paid_installments: u32,
) -> Money {
    installment_amount.times(total_installments.saturating_sub(paid_installments))
}

/// record one installment, returning the updated loan
///
/// The input loan is left untouched. Installment and total amounts are
/// carried over unchanged; only the paid count, remaining amount and
/// status move. Callers must serialize this per loan id against their
/// store, see [`crate::store::LoanStore::update`].
pub fn apply_payment(loan: &Loan) -> Result<Loan> {
    if loan.paid_installments >= loan.total_installments {
        return Err(LoanError::AlreadyPaid {
            loan_id: loan.id,
            total_installments: loan.total_installments,
        });
    }

    let mut updated = loan.clone();
    updated.paid_installments += 1;
    updated.remaining_amount = compute_remaining(
        updated.installment_amount,
        updated.total_installments,
        updated.paid_installments,
    );
    updated.status = derive_status(updated.paid_installments, updated.total_installments);

    Ok(updated)
}
