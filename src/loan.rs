use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::{
    self, amortization_schedule, compute_remaining, derive_status, installment_due_date,
    InstallmentQuote, ScheduledInstallment,
};
use crate::config::{LoanTerms, TermsEdit};
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{LoanId, LoanStatus, ParticipantId};

/// a loan made to a fund participant
///
/// Installment, total, remaining and status are derived from the terms and
/// the paid count. Fields are private so the derived values can only come
/// out of the amortization functions; deserialization recomputes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "LoanRecord", try_from = "LoanRecord")]
pub struct Loan {
    pub(crate) id: LoanId,
    pub(crate) participant_id: ParticipantId,
    pub(crate) principal_amount: Money,
    pub(crate) interest_rate: Rate,
    pub(crate) total_installments: u32,
    pub(crate) paid_installments: u32,
    pub(crate) installment_amount: Money,
    pub(crate) total_amount: Money,
    pub(crate) remaining_amount: Money,
    pub(crate) status: LoanStatus,
    pub(crate) start_date: NaiveDate,
    pub(crate) due_date: NaiveDate,
    pub(crate) last_payment_date: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// what an administrative edit changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsChange {
    pub previous_quote: InstallmentQuote,
    pub new_quote: InstallmentQuote,
    pub previous_status: LoanStatus,
    pub new_status: LoanStatus,
    /// paid count before clamping, when the new term is shorter than it
    pub clamped_from: Option<u32>,
}

impl Loan {
    /// open a new loan with no installments paid
    pub fn open(
        participant_id: impl Into<ParticipantId>,
        terms: &LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        let participant_id = participant_id.into();
        if participant_id.trim().is_empty() {
            return Err(LoanError::invalid("participant id must not be empty"));
        }

        let (quote, due_date) = terms.validate()?;
        let now = time_provider.now();

        Ok(Self {
            id: Uuid::new_v4(),
            participant_id,
            principal_amount: terms.principal_amount,
            interest_rate: terms.interest_rate,
            total_installments: terms.total_installments,
            paid_installments: 0,
            installment_amount: quote.installment_amount,
            total_amount: quote.total_amount,
            remaining_amount: compute_remaining(quote.installment_amount, terms.total_installments, 0),
            status: derive_status(0, terms.total_installments),
            start_date: terms.start_date,
            due_date,
            last_payment_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn principal_amount(&self) -> Money {
        self.principal_amount
    }

    pub fn interest_rate(&self) -> Rate {
        self.interest_rate
    }

    pub fn total_installments(&self) -> u32 {
        self.total_installments
    }

    pub fn paid_installments(&self) -> u32 {
        self.paid_installments
    }

    pub fn remaining_installments(&self) -> u32 {
        self.total_installments.saturating_sub(self.paid_installments)
    }

    pub fn installment_amount(&self) -> Money {
        self.installment_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn total_interest(&self) -> Money {
        self.total_amount - self.principal_amount
    }

    pub fn remaining_amount(&self) -> Money {
        self.remaining_amount
    }

    pub fn amount_paid(&self) -> Money {
        self.installment_amount.times(self.paid_installments)
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn last_payment_date(&self) -> Option<DateTime<Utc>> {
        self.last_payment_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// current terms, with the resolved due date made explicit
    pub fn terms(&self) -> LoanTerms {
        LoanTerms::new(
            self.principal_amount,
            self.interest_rate,
            self.total_installments,
            self.start_date,
        )
        .with_due_date(self.due_date)
    }

    pub fn quote(&self) -> InstallmentQuote {
        InstallmentQuote {
            installment_amount: self.installment_amount,
            total_amount: self.total_amount,
            total_interest: self.total_interest(),
        }
    }

    pub fn schedule(&self) -> Result<Vec<ScheduledInstallment>> {
        amortization_schedule(&self.quote(), self.total_installments, self.start_date)
    }

    /// due date of the next unpaid installment, `None` once paid off
    pub fn next_due_date(&self) -> Result<Option<NaiveDate>> {
        if self.status.is_terminal() {
            return Ok(None);
        }
        installment_due_date(self.start_date, self.paid_installments + 1).map(Some)
    }

    /// true when the next unpaid installment fell due before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> Result<bool> {
        Ok(self.next_due_date()?.map_or(false, |due| due < today))
    }

    /// record one installment at the provider's current time
    ///
    /// On error the loan is left as it was.
    pub fn record_payment(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        let now = time_provider.now();
        let mut updated = amortization::apply_payment(self)?;
        updated.last_payment_date = Some(now);
        updated.updated_at = now;
        *self = updated;
        Ok(())
    }

    /// apply an administrative edit of principal, rate, term or dates
    ///
    /// All derived fields are recomputed. A term shortened below the paid
    /// count clamps the paid count to the new term.
    pub fn edit_terms(
        &mut self,
        edit: &TermsEdit,
        time_provider: &SafeTimeProvider,
    ) -> Result<TermsChange> {
        let mut base = self.terms();
        if edit.total_installments.is_some() && edit.due_date.is_none() {
            // let the due date follow the new term
            base.due_date = None;
        }
        let terms = base.merge(edit);
        let (new_quote, due_date) = terms.validate()?;

        let previous_quote = self.quote();
        let previous_status = self.status;
        let clamped_from = (self.paid_installments > terms.total_installments)
            .then_some(self.paid_installments);

        self.principal_amount = terms.principal_amount;
        self.interest_rate = terms.interest_rate;
        self.total_installments = terms.total_installments;
        self.start_date = terms.start_date;
        self.due_date = due_date;
        self.paid_installments = self.paid_installments.min(terms.total_installments);
        self.apply_quote(new_quote);
        self.updated_at = time_provider.now();

        Ok(TermsChange {
            previous_quote,
            new_quote,
            previous_status,
            new_status: self.status,
            clamped_from,
        })
    }

    fn apply_quote(&mut self, quote: InstallmentQuote) {
        self.installment_amount = quote.installment_amount;
        self.total_amount = quote.total_amount;
        self.remaining_amount = compute_remaining(
            quote.installment_amount,
            self.total_installments,
            self.paid_installments,
        );
        self.status = derive_status(self.paid_installments, self.total_installments);
    }
}

/// stored shape of a loan
///
/// Derived fields are written for readers of the stored document but are
/// ignored on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: LoanId,
    pub participant_id: ParticipantId,
    pub principal_amount: Money,
    pub interest_rate: Rate,
    pub total_installments: u32,
    pub paid_installments: u32,
    #[serde(default)]
    pub installment_amount: Money,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub remaining_amount: Money,
    #[serde(default)]
    pub status: LoanStatus,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub last_payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Loan> for LoanRecord {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id,
            participant_id: loan.participant_id,
            principal_amount: loan.principal_amount,
            interest_rate: loan.interest_rate,
            total_installments: loan.total_installments,
            paid_installments: loan.paid_installments,
            installment_amount: loan.installment_amount,
            total_amount: loan.total_amount,
            remaining_amount: loan.remaining_amount,
            status: loan.status,
            start_date: loan.start_date,
            due_date: loan.due_date,
            last_payment_date: loan.last_payment_date,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }
}

impl TryFrom<LoanRecord> for Loan {
    type Error = LoanError;

    fn try_from(record: LoanRecord) -> Result<Self> {
        let terms = LoanTerms::new(
            record.principal_amount,
            record.interest_rate,
            record.total_installments,
            record.start_date,
        )
        .with_due_date(record.due_date);
        let (quote, due_date) = terms.validate()?;

        let mut loan = Self {
            id: record.id,
            participant_id: record.participant_id,
            principal_amount: record.principal_amount,
            interest_rate: record.interest_rate,
            total_installments: record.total_installments,
            paid_installments: record.paid_installments.min(record.total_installments),
            installment_amount: quote.installment_amount,
            total_amount: quote.total_amount,
            remaining_amount: Money::ZERO,
            status: LoanStatus::Pending,
            start_date: record.start_date,
            due_date,
            last_payment_date: record.last_payment_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        loan.apply_quote(quote);
        Ok(loan)
    }
}

/// builder for new loans
#[derive(Debug, Default)]
pub struct LoanBuilder {
    participant_id: Option<ParticipantId>,
    principal: Option<Money>,
    rate: Option<Rate>,
    installments: Option<u32>,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participant_id(mut self, participant_id: impl Into<ParticipantId>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    pub fn principal(mut self, amount: Money) -> Self {
        self.principal = Some(amount);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn installments(mut self, count: u32) -> Self {
        self.installments = Some(count);
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

    /// terms collected so far; start date defaults to the provider's today
    pub fn terms(&self, time_provider: &SafeTimeProvider) -> Result<LoanTerms> {
        let principal = self
            .principal
            .ok_or_else(|| LoanError::invalid("principal is required"))?;
        let installments = self
            .installments
            .ok_or_else(|| LoanError::invalid("installment count is required"))?;

        Ok(LoanTerms {
            principal_amount: principal,
            interest_rate: self.rate.unwrap_or(Rate::ZERO),
            total_installments: installments,
            start_date: self
                .start_date
                .unwrap_or_else(|| time_provider.now().date_naive()),
            due_date: self.due_date,
        })
    }

    pub fn build(self, time_provider: &SafeTimeProvider) -> Result<Loan> {
        let terms = self.terms(time_provider)?;
        let participant_id = self
            .participant_id
            .ok_or_else(|| LoanError::invalid("participant id is required"))?;
        Loan::open(participant_id, &terms, time_provider)
    }

    /// build using system time
    pub fn build_now(self) -> Result<Loan> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.build(&time)
    }
}
