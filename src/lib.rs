pub mod amortization;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod loan;
pub mod service;
pub mod store;
pub mod types;
pub mod view;

// re-export key types
pub use amortization::{
    amortization_schedule, apply_payment, compute_installment, compute_remaining, derive_status,
    InstallmentQuote, ScheduledInstallment, MAX_INSTALLMENTS,
};
pub use config::{LoanTerms, ServiceConfig, TermsEdit};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use loan::{Loan, LoanBuilder, LoanRecord, TermsChange};
pub use service::LoanService;
pub use store::{InMemoryLoanStore, LoanStore, VersionedLoan};
pub use types::{LoanId, LoanStatus, ParticipantId};
pub use view::LoanView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
