use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::types::LoanId;

/// a loan together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedLoan {
    pub loan: Loan,
    pub version: u64,
}

/// contract for loan record stores
///
/// Every record carries a version that increases on each write. `update`
/// names the version it read and fails with
/// [`LoanError::ConcurrentModification`] when that version is stale.
pub trait LoanStore: Send + Sync {
    /// store a new loan at version 1
    fn insert(&self, loan: Loan) -> Result<VersionedLoan>;

    fn get(&self, loan_id: LoanId) -> Result<VersionedLoan>;

    /// replace the record only if it is still at `expected_version`
    fn update(&self, loan_id: LoanId, expected_version: u64, loan: Loan) -> Result<VersionedLoan>;

    fn delete(&self, loan_id: LoanId) -> Result<Loan>;

    /// all loans, or only those of one participant, oldest first
    fn list(&self, participant_id: Option<&str>) -> Result<Vec<VersionedLoan>>;
}

/// in-process store, shareable across threads behind an `Arc`
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    records: RwLock<HashMap<LoanId, VersionedLoan>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<LoanId, VersionedLoan>>> {
        self.records.read().map_err(|e| LoanError::StoreUnavailable {
            message: e.to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<LoanId, VersionedLoan>>> {
        self.records.write().map_err(|e| LoanError::StoreUnavailable {
            message: e.to_string(),
        })
    }
}

impl LoanStore for InMemoryLoanStore {
    fn insert(&self, loan: Loan) -> Result<VersionedLoan> {
        let mut records = self.write()?;
        let loan_id = loan.id();
        if records.contains_key(&loan_id) {
            return Err(LoanError::DuplicateLoan { loan_id });
        }

        let record = VersionedLoan { loan, version: 1 };
        records.insert(loan_id, record.clone());
        debug!("inserted loan {}", loan_id);
        Ok(record)
    }

    fn get(&self, loan_id: LoanId) -> Result<VersionedLoan> {
        self.read()?
            .get(&loan_id)
            .cloned()
            .ok_or(LoanError::LoanNotFound { loan_id })
    }

    fn update(&self, loan_id: LoanId, expected_version: u64, loan: Loan) -> Result<VersionedLoan> {
        if loan.id() != loan_id {
            return Err(LoanError::invalid(format!(
                "record {} cannot be written under loan id {}",
                loan.id(),
                loan_id
            )));
        }

        let mut records = self.write()?;
        let current = records
            .get_mut(&loan_id)
            .ok_or(LoanError::LoanNotFound { loan_id })?;

        if current.version != expected_version {
            warn!(
                "version conflict on loan {}: expected {}, found {}",
                loan_id, expected_version, current.version
            );
            return Err(LoanError::ConcurrentModification {
                loan_id,
                expected: expected_version,
                found: current.version,
            });
        }

        current.loan = loan;
        current.version += 1;
        debug!("updated loan {} to version {}", loan_id, current.version);
        Ok(current.clone())
    }

    fn delete(&self, loan_id: LoanId) -> Result<Loan> {
        let removed = self
            .write()?
            .remove(&loan_id)
            .ok_or(LoanError::LoanNotFound { loan_id })?;
        debug!("deleted loan {}", loan_id);
        Ok(removed.loan)
    }

    fn list(&self, participant_id: Option<&str>) -> Result<Vec<VersionedLoan>> {
        let records = self.read()?;
        let mut loans: Vec<VersionedLoan> = records
            .values()
            .filter(|record| {
                participant_id
                    .map(|p| record.loan.participant_id() == p)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        loans.sort_by_key(|record| (record.loan.created_at(), record.loan.id()));
        Ok(loans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn loan_for(participant: &str, time: &SafeTimeProvider) -> Loan {
        Loan::builder()
            .participant_id(participant)
            .principal(Money::from_major(3_000))
            .rate(Rate::from_percentage(12))
            .installments(3)
            .build(time)
            .unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let time = test_time();
        let store = InMemoryLoanStore::new();
        let loan = loan_for("member-1", &time);
        let loan_id = loan.id();

        let stored = store.insert(loan.clone()).unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(store.get(loan_id).unwrap().loan, loan);
        assert_eq!(store.len(), 1);

        assert_eq!(store.insert(loan), Err(LoanError::DuplicateLoan { loan_id }));
    }

    #[test]
    fn test_update_bumps_version() {
        let time = test_time();
        let store = InMemoryLoanStore::new();
        let stored = store.insert(loan_for("member-1", &time)).unwrap();

        let mut loan = stored.loan.clone();
        loan.record_payment(&time).unwrap();
        let updated = store.update(loan.id(), stored.version, loan).unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.loan.paid_installments(), 1);
    }

    #[test]
    fn test_stale_update_rejected() {
        let time = test_time();
        let store = InMemoryLoanStore::new();
        let stored = store.insert(loan_for("member-1", &time)).unwrap();
        let loan_id = stored.loan.id();

        let mut first = stored.loan.clone();
        first.record_payment(&time).unwrap();
        store.update(loan_id, 1, first).unwrap();

        let mut second = stored.loan.clone();
        second.record_payment(&time).unwrap();
        let result = store.update(loan_id, 1, second);

        assert_eq!(
            result,
            Err(LoanError::ConcurrentModification {
                loan_id,
                expected: 1,
                found: 2,
            })
        );
        assert_eq!(store.get(loan_id).unwrap().loan.paid_installments(), 1);
    }

    #[test]
    fn test_update_with_mismatched_id_rejected() {
        let time = test_time();
        let store = InMemoryLoanStore::new();
        let stored = store.insert(loan_for("member-1", &time)).unwrap();
        let other = loan_for("member-2", &time);

        let result = store.update(stored.loan.id(), 1, other);
        assert!(matches!(result, Err(LoanError::InvalidParameter { .. })));
    }

    #[test]
    fn test_missing_loan() {
        let store = InMemoryLoanStore::new();
        let loan_id = uuid::Uuid::new_v4();

        assert_eq!(store.get(loan_id), Err(LoanError::LoanNotFound { loan_id }));
        assert_eq!(store.delete(loan_id), Err(LoanError::LoanNotFound { loan_id }));
    }

    #[test]
    fn test_list_filters_and_orders() {
        let time = test_time();
        let control = time.test_control().unwrap();
        let store = InMemoryLoanStore::new();

        let first = store.insert(loan_for("member-1", &time)).unwrap();
        control.advance(Duration::days(1));
        store.insert(loan_for("member-2", &time)).unwrap();
        control.advance(Duration::days(1));
        let third = store.insert(loan_for("member-1", &time)).unwrap();

        assert_eq!(store.list(None).unwrap().len(), 3);

        let mine = store.list(Some("member-1")).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].loan.id(), first.loan.id());
        assert_eq!(mine[1].loan.id(), third.loan.id());

        assert!(store.list(Some("member-9")).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let time = test_time();
        let store = InMemoryLoanStore::new();
        let stored = store.insert(loan_for("member-1", &time)).unwrap();

        let removed = store.delete(stored.loan.id()).unwrap();
        assert_eq!(removed, stored.loan);
        assert!(store.is_empty());
    }
}
