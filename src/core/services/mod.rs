pub mod matching_service;
pub mod payment_service;
pub mod reconciliation_service;
pub mod transaction_service;

pub use matching_service::{MatchDetails, MatchScore, MatchingService, TransactionBillMatch};
pub use payment_service::PaymentService;
pub use reconciliation_service::{
    AppliedMatch, ReconciliationReport, ReconciliationService, SUGGESTION_FLOOR,
};
pub use transaction_service::TransactionService;

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, LedgerError>;
