use hourglass_rs::SafeTimeProvider;
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};

use crate::amortization::InstallmentQuote;
use crate::config::{LoanTerms, ServiceConfig, TermsEdit};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::{Loan, TermsChange};
use crate::store::{LoanStore, VersionedLoan};
use crate::types::{LoanId, LoanStatus, ParticipantId};
use crate::view::LoanView;

/// administrative entry point over a loan store
///
/// Mutations run as read, modify, compare-and-swap write. A version
/// collision is retried `max_write_retries` times before it is returned.
pub struct LoanService<S: LoanStore> {
    store: S,
    config: ServiceConfig,
    events: Mutex<EventStore>,
}

impl<S: LoanStore> LoanService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Self {
        Self {
            store,
            config,
            events: Mutex::new(EventStore::new()),
        }
    }

    pub fn with_defaults(store: S) -> Self {
        Self::new(store, ServiceConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// live preview for a loan form; nothing is stored
    pub fn preview(&self, terms: &LoanTerms) -> Result<InstallmentQuote> {
        terms.quote()
    }

    pub fn create_loan(
        &self,
        participant_id: impl Into<ParticipantId>,
        terms: &LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        let loan = Loan::open(participant_id, terms, time_provider)?;
        let stored = self.store.insert(loan)?;
        let loan = stored.loan;

        info!(
            "created loan {} for {}: {} {} over {} installments of {}",
            loan.id(),
            loan.participant_id(),
            self.config.currency,
            loan.principal_amount(),
            loan.total_installments(),
            loan.installment_amount()
        );

        self.emit(Event::LoanCreated {
            loan_id: loan.id(),
            participant_id: loan.participant_id().to_string(),
            principal_amount: loan.principal_amount(),
            interest_rate: loan.interest_rate(),
            total_installments: loan.total_installments(),
            installment_amount: loan.installment_amount(),
            timestamp: loan.created_at(),
        });

        Ok(loan)
    }

    pub fn get_loan(&self, loan_id: LoanId) -> Result<Loan> {
        Ok(self.store.get(loan_id)?.loan)
    }

    pub fn list_loans(&self, participant_id: Option<&str>) -> Result<Vec<Loan>> {
        Ok(self
            .store
            .list(participant_id)?
            .into_iter()
            .map(|record| record.loan)
            .collect())
    }

    /// read-only view for the participant dashboard
    pub fn loan_view(&self, loan_id: LoanId) -> Result<LoanView> {
        let loan = self.get_loan(loan_id)?;
        LoanView::from_loan(&loan, &self.config.currency)
    }

    /// record one installment against a loan
    pub fn record_payment(&self, loan_id: LoanId, time_provider: &SafeTimeProvider) -> Result<Loan> {
        let (before, after, ()) =
            self.modify(loan_id, |loan| loan.record_payment(time_provider))?;
        let now = time_provider.now();

        info!(
            "loan {}: installment {}/{} paid, {} {} remaining",
            loan_id,
            after.paid_installments(),
            after.total_installments(),
            self.config.currency,
            after.remaining_amount()
        );

        self.emit(Event::InstallmentPaid {
            loan_id,
            participant_id: after.participant_id().to_string(),
            installment_number: after.paid_installments(),
            amount: after.installment_amount(),
            remaining_amount: after.remaining_amount(),
            timestamp: now,
        });
        self.emit_status_change(&before, &after, "installment paid", now);

        if after.status() == LoanStatus::Paid {
            self.emit(Event::LoanPaid {
                loan_id,
                participant_id: after.participant_id().to_string(),
                total_amount: after.total_amount(),
                timestamp: now,
            });
        }

        Ok(after)
    }

    /// administrative edit of principal, rate, term or dates
    pub fn edit_terms(
        &self,
        loan_id: LoanId,
        edit: &TermsEdit,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        if edit.is_empty() {
            return self.get_loan(loan_id);
        }

        let (before, after, change) =
            self.modify(loan_id, |loan| loan.edit_terms(edit, time_provider))?;
        let now = time_provider.now();

        info!(
            "loan {}: terms edited, installment {} -> {}",
            loan_id, change.previous_quote.installment_amount, change.new_quote.installment_amount
        );

        self.emit(Event::TermsEdited {
            loan_id,
            old_installment_amount: change.previous_quote.installment_amount,
            new_installment_amount: change.new_quote.installment_amount,
            old_total_amount: change.previous_quote.total_amount,
            new_total_amount: change.new_quote.total_amount,
            timestamp: now,
        });
        self.emit_clamp(loan_id, &change, after.paid_installments(), now);
        self.emit_status_change(&before, &after, "terms edited", now);

        Ok(after)
    }

    pub fn delete_loan(&self, loan_id: LoanId, time_provider: &SafeTimeProvider) -> Result<Loan> {
        let loan = self.store.delete(loan_id)?;
        info!("deleted loan {} of {}", loan_id, loan.participant_id());

        self.emit(Event::LoanDeleted {
            loan_id,
            participant_id: loan.participant_id().to_string(),
            paid_installments: loan.paid_installments(),
            timestamp: time_provider.now(),
        });

        Ok(loan)
    }

    /// drain events emitted so far
    pub fn take_events(&self) -> Vec<Event> {
        self.lock_events().take_events()
    }

    /// read, mutate a copy, write back against the version read
    fn modify<T, F>(&self, loan_id: LoanId, mut mutate: F) -> Result<(Loan, Loan, T)>
    where
        F: FnMut(&mut Loan) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            let VersionedLoan { loan: before, version } = self.store.get(loan_id)?;
            let mut after = before.clone();
            let outcome = mutate(&mut after)?;

            match self.store.update(loan_id, version, after) {
                Ok(stored) => return Ok((before, stored.loan, outcome)),
                Err(LoanError::ConcurrentModification { .. }) if attempt < self.config.max_write_retries => {
                    attempt += 1;
                    debug!("loan {}: retrying write, attempt {}", loan_id, attempt + 1);
                }
                Err(e) => {
                    if matches!(e, LoanError::ConcurrentModification { .. }) {
                        warn!("loan {}: giving up after {} attempts", loan_id, attempt + 1);
                    }
                    return Err(e);
                }
            }
        }
    }

    fn emit_status_change(
        &self,
        before: &Loan,
        after: &Loan,
        reason: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) {
        if before.status() != after.status() {
            self.emit(Event::StatusChanged {
                loan_id: after.id(),
                old_status: before.status(),
                new_status: after.status(),
                reason: reason.to_string(),
                timestamp,
            });
        }
    }

    fn emit_clamp(
        &self,
        loan_id: LoanId,
        change: &TermsChange,
        paid_now: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) {
        if let Some(old_paid) = change.clamped_from {
            warn!(
                "loan {}: paid installments clamped from {} to {}",
                loan_id, old_paid, paid_now
            );
            self.emit(Event::PaidInstallmentsClamped {
                loan_id,
                old_paid_installments: old_paid,
                new_paid_installments: paid_now,
                timestamp,
            });
        }
    }

    fn emit(&self, event: Event) {
        self.lock_events().emit(event);
    }

    fn lock_events(&self) -> MutexGuard<'_, EventStore> {
        // events are plain data; a panic elsewhere cannot leave them half-written
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
