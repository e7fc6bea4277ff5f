//! Ledger entries, bill definitions, and occurrence expansion.

pub mod recurring;
pub mod time_interval;
pub mod transaction;

pub use recurring::{expand, generate_occurrences, lookup_payment, BillOccurrence};
pub use time_interval::MonthWindow;
pub use transaction::{
    BillDefinition, BillFields, BillPayment, Frequency, LedgerEntry, Transaction,
};
