use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::amortization::{InstallmentQuote, MAX_INSTALLMENTS};
use crate::decimal::Money;
use crate::errors::{LoanError, Result};

/// one row of an installment schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledInstallment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub cumulative_paid: Money,
    pub balance_after: Money,
}

/// due date of installment `number` (1-based), one calendar month apart
pub fn installment_due_date(start_date: NaiveDate, number: u32) -> Result<NaiveDate> {
    start_date
        .checked_add_months(Months::new(number))
        .ok_or_else(|| LoanError::InvalidDate {
            message: format!("installment {} falls outside the calendar", number),
        })
}

/// build the installment schedule for a quote
///
/// Rows are due the fixed installment, capped at what is still owed, and
/// the last row settles the remainder, so the schedule sums to
/// `total_amount` even when the installment was rounded up.
pub fn amortization_schedule(
    quote: &InstallmentQuote,
    total_installments: u32,
    start_date: NaiveDate,
) -> Result<Vec<ScheduledInstallment>> {
    if total_installments > MAX_INSTALLMENTS {
        return Err(LoanError::invalid(format!(
            "total installments must be at most {}, got {}",
            MAX_INSTALLMENTS, total_installments
        )));
    }

    let mut rows = Vec::with_capacity(total_installments as usize);
    let mut cumulative = Money::ZERO;

    for number in 1..=total_installments {
        let outstanding = (quote.total_amount - cumulative).max(Money::ZERO);
        let amount_due = if number == total_installments {
            outstanding
        } else {
            quote.installment_amount.min(outstanding)
        };
        cumulative += amount_due;

        rows.push(ScheduledInstallment {
            installment_number: number,
            due_date: installment_due_date(start_date, number)?,
            amount_due,
            cumulative_paid: cumulative,
            balance_after: (quote.total_amount - cumulative).max(Money::ZERO),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::compute_installment;
    use crate::decimal::Rate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_even_schedule() {
        let quote = compute_installment(Money::from_major(12_000), Rate::from_percentage(12), 12)
            .unwrap();
        let rows = amortization_schedule(&quote, 12, date(2024, 1, 15)).unwrap();

        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.amount_due == Money::from_major(1_120)));
        assert_eq!(rows[0].due_date, date(2024, 2, 15));
        assert_eq!(rows[11].due_date, date(2025, 1, 15));
        assert_eq!(rows[0].balance_after, Money::from_major(12_320));
        assert_eq!(rows[11].balance_after, Money::ZERO);
        assert_eq!(rows[11].cumulative_paid, Money::from_major(13_440));
    }

    #[test]
    fn test_last_row_absorbs_rounding() {
        let quote = compute_installment(Money::from_major(10), Rate::ZERO, 3).unwrap();
        let rows = amortization_schedule(&quote, 3, date(2024, 1, 1)).unwrap();

        assert_eq!(rows[0].amount_due, Money::from(dec!(3.33)));
        assert_eq!(rows[1].amount_due, Money::from(dec!(3.33)));
        assert_eq!(rows[2].amount_due, Money::from(dec!(3.34)));
        assert_eq!(rows[2].cumulative_paid, Money::from_major(10));
        assert_eq!(rows[2].balance_after, Money::ZERO);
    }

    #[test]
    fn test_rounded_up_installment_never_overcollects() {
        // 0.05 / 10 = 0.005 rounds up to 0.01
        let quote = compute_installment(Money::from(dec!(0.05)), Rate::ZERO, 10).unwrap();
        assert_eq!(quote.installment_amount, Money::MINOR_UNIT);

        let rows = amortization_schedule(&quote, 10, date(2024, 1, 1)).unwrap();
        let collected = rows.iter().fold(Money::ZERO, |sum, r| sum + r.amount_due);

        assert_eq!(collected, Money::from(dec!(0.05)));
        assert!(rows[..5].iter().all(|r| r.amount_due == Money::MINOR_UNIT));
        assert!(rows[5..].iter().all(|r| r.amount_due.is_zero()));
        assert_eq!(rows[9].balance_after, Money::ZERO);
    }

    #[test]
    fn test_schedule_longer_than_limit_rejected() {
        let quote = compute_installment(Money::from_major(100), Rate::ZERO, 1).unwrap();
        let result = amortization_schedule(&quote, 2_000_000_000, date(2024, 1, 1));
        assert!(matches!(result, Err(LoanError::InvalidParameter { .. })));
    }

    #[test]
    fn test_month_end_start_clamps_to_shorter_months() {
        let quote = compute_installment(Money::from_major(3_000), Rate::ZERO, 3).unwrap();
        let rows = amortization_schedule(&quote, 3, date(2024, 1, 31)).unwrap();

        assert_eq!(rows[0].due_date, date(2024, 2, 29));
        assert_eq!(rows[1].due_date, date(2024, 3, 31));
        assert_eq!(rows[2].due_date, date(2024, 4, 30));
    }
}
