use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, LoanStatus, ParticipantId};

/// events emitted by loan mutations, drained by the notification side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanCreated {
        loan_id: LoanId,
        participant_id: ParticipantId,
        principal_amount: Money,
        interest_rate: Rate,
        total_installments: u32,
        installment_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDeleted {
        loan_id: LoanId,
        participant_id: ParticipantId,
        paid_installments: u32,
        timestamp: DateTime<Utc>,
    },

    // payment events
    InstallmentPaid {
        loan_id: LoanId,
        participant_id: ParticipantId,
        installment_number: u32,
        amount: Money,
        remaining_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanPaid {
        loan_id: LoanId,
        participant_id: ParticipantId,
        total_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // admin edit events
    TermsEdited {
        loan_id: LoanId,
        old_installment_amount: Money,
        new_installment_amount: Money,
        old_total_amount: Money,
        new_total_amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaidInstallmentsClamped {
        loan_id: LoanId,
        old_paid_installments: u32,
        new_paid_installments: u32,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
