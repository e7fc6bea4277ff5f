//! Manual linking and unlinking of transactions and bill occurrences.
//!
//! Every operation takes the current collection and returns a replacement;
//! the input is never modified, so a failed call leaves the caller's state untouched.

use chrono::NaiveDate;

use crate::core::services::ServiceResult;
use crate::errors::LedgerError;
use crate::ledger::{BillFields, BillPayment, LedgerEntry};

pub struct PaymentService;

impl PaymentService {
    /// Links a transaction to a bill occurrence on the user's say-so, replacing any
    /// payment already recorded for that occurrence.
    pub fn manual_match(
        entries: &[LedgerEntry],
        transaction_id: &str,
        bill_id: &str,
        occurrence_date: NaiveDate,
        tolerance: f64,
    ) -> ServiceResult<Vec<LedgerEntry>> {
        let txn_index = plain_index(entries, transaction_id)?;
        let bill_index = bill_index(entries, bill_id)?;

        let transaction = entries[txn_index]
            .as_plain()
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        let bill_amount = entries[bill_index]
            .as_bill()
            .map(|def| def.bill.amount)
            .ok_or_else(|| LedgerError::BillNotFound(bill_id.to_string()))?;

        let difference = (transaction.amount.abs() - bill_amount).abs();
        if difference > tolerance {
            return Err(LedgerError::AmountMismatch {
                difference,
                tolerance,
            });
        }

        let payment = BillPayment::from_transaction(occurrence_date, transaction, true);
        // A relinked transaction must not leave its old payment behind.
        let mut updated = if transaction.is_matched() {
            Self::unmatch(entries, transaction_id)?
        } else {
            entries.to_vec()
        };
        // The payer of an overwritten payment is released unless it still pays
        // another occurrence of this bill.
        let displaced = updated[bill_index].as_bill().and_then(|def| {
            let payments = &def.bill.payments;
            payments
                .iter()
                .find(|p| p.occurrence_date == occurrence_date)
                .map(|p| p.transaction_date)
                .filter(|paid_on| {
                    !payments
                        .iter()
                        .any(|p| p.occurrence_date != occurrence_date && p.transaction_date == *paid_on)
                })
        });
        if let Some(paid_on) = displaced {
            release_payer(&mut updated, bill_id, paid_on, txn_index);
        }
        if let Some(txn) = updated[txn_index].as_plain_mut() {
            txn.link_to_bill(bill_id);
        }
        if let Some(def) = updated[bill_index].as_bill_mut() {
            def.bill.payments = upsert_payment(&def.bill.payments, payment, true);
        }
        tracing::info!(
            transaction = transaction_id,
            bill = bill_id,
            occurrence = %occurrence_date,
            "manual match recorded"
        );
        Ok(updated)
    }

    /// Removes a transaction's bill link and the payment it produced. A transaction
    /// without a link is returned unchanged.
    pub fn unmatch(entries: &[LedgerEntry], transaction_id: &str) -> ServiceResult<Vec<LedgerEntry>> {
        let txn_index = plain_index(entries, transaction_id)?;
        let Some(transaction) = entries[txn_index].as_plain() else {
            return Err(LedgerError::TransactionNotFound(transaction_id.to_string()));
        };
        let Some(bill_id) = transaction.matched_to_bill_id.clone() else {
            return Ok(entries.to_vec());
        };
        let paid_on = transaction.date;

        let mut updated = entries.to_vec();
        if let Some(txn) = updated[txn_index].as_plain_mut() {
            txn.clear_bill_link();
        }

        if !drop_payments_paid_on(&mut updated, &bill_id, paid_on) {
            tracing::warn!(
                transaction = transaction_id,
                bill = %bill_id,
                "unmatched transaction pointed at a missing bill"
            );
        }
        Ok(updated)
    }

    /// Records a manual payment of the full bill amount without a backing transaction.
    pub fn mark_paid(
        entries: &[LedgerEntry],
        bill_id: &str,
        occurrence_date: NaiveDate,
    ) -> ServiceResult<Vec<LedgerEntry>> {
        let index = bill_index(entries, bill_id)?;
        let mut updated = entries.to_vec();
        if let Some(def) = updated[index].as_bill_mut() {
            let payment = BillPayment {
                occurrence_date,
                transaction_date: occurrence_date,
                transaction_amount: -def.bill.amount,
                transaction_description: format!("Marked paid: {}", def.bill.name),
                manually_marked: true,
            };
            def.bill.payments = upsert_payment(&def.bill.payments, payment, true);
        }
        Ok(updated)
    }

    /// Forgets any payment recorded for one occurrence, structured or legacy.
    /// Transactions linked to it keep their link until they are unmatched.
    pub fn clear_payment(
        entries: &[LedgerEntry],
        bill_id: &str,
        occurrence_date: NaiveDate,
    ) -> ServiceResult<Vec<LedgerEntry>> {
        let index = bill_index(entries, bill_id)?;
        let mut updated = entries.to_vec();
        if let Some(def) = updated[index].as_bill_mut() {
            def.bill.payments.retain(|p| p.occurrence_date != occurrence_date);
            def.bill.paid_dates.retain(|date| *date != occurrence_date);
        }
        Ok(updated)
    }

    /// Converts legacy `paid_dates` into structured manual payments.
    pub fn migrate_legacy_payments(entries: &[LedgerEntry]) -> Vec<LedgerEntry> {
        let mut updated = entries.to_vec();
        for def in updated.iter_mut().filter_map(LedgerEntry::as_bill_mut) {
            if def.bill.paid_dates.is_empty() {
                continue;
            }
            let migrated = legacy_as_payments(&def.bill);
            tracing::debug!(bill = %def.id(), count = migrated.len(), "migrated legacy paid dates");
            def.bill.payments.extend(migrated);
            def.bill.payments.sort_by_key(|payment| payment.occurrence_date);
            def.bill.paid_dates.clear();
        }
        updated
    }
}

/// Inserts `payment` for its occurrence, or replaces the existing one. Without
/// `overwrite_manual`, a manually marked payment already in place is kept.
pub(crate) fn upsert_payment(
    payments: &[BillPayment],
    payment: BillPayment,
    overwrite_manual: bool,
) -> Vec<BillPayment> {
    let occurrence_date = payment.occurrence_date;
    let existing = payments
        .iter()
        .find(|p| p.occurrence_date == occurrence_date);
    if let Some(existing) = existing {
        if existing.manually_marked && !overwrite_manual {
            return payments.to_vec();
        }
    }
    payments
        .iter()
        .filter(|p| p.occurrence_date != occurrence_date)
        .cloned()
        .chain(std::iter::once(payment))
        .collect()
}

/// Drops every payment on `bill_id` that came from a transaction dated `paid_on`.
/// Returns `false` when the bill does not exist.
pub(crate) fn drop_payments_paid_on(
    entries: &mut [LedgerEntry],
    bill_id: &str,
    paid_on: NaiveDate,
) -> bool {
    let bill = entries
        .iter_mut()
        .filter_map(LedgerEntry::as_bill_mut)
        .find(|def| def.id() == bill_id);
    match bill {
        Some(def) => {
            def.bill.payments.retain(|payment| payment.transaction_date != paid_on);
            true
        }
        None => false,
    }
}

/// Clears the link of the transaction whose payment on `bill_id` is being replaced.
fn release_payer(entries: &mut [LedgerEntry], bill_id: &str, paid_on: NaiveDate, keep: usize) {
    for (index, entry) in entries.iter_mut().enumerate() {
        if index == keep {
            continue;
        }
        if let Some(txn) = entry.as_plain_mut() {
            if txn.date == paid_on && txn.matched_to_bill_id.as_deref() == Some(bill_id) {
                txn.clear_bill_link();
            }
        }
    }
}

fn legacy_as_payments(bill: &BillFields) -> Vec<BillPayment> {
    let mut dates = bill.paid_dates.clone();
    dates.sort();
    dates.dedup();
    dates
        .into_iter()
        .filter(|date| !bill.payments.iter().any(|p| p.occurrence_date == *date))
        .map(|date| BillPayment {
            occurrence_date: date,
            transaction_date: date,
            transaction_amount: -bill.amount,
            transaction_description: String::new(),
            manually_marked: true,
        })
        .collect()
}

fn plain_index(entries: &[LedgerEntry], transaction_id: &str) -> ServiceResult<usize> {
    entries
        .iter()
        .position(|entry| !entry.is_bill() && entry.key() == transaction_id)
        .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))
}

fn bill_index(entries: &[LedgerEntry], bill_id: &str) -> ServiceResult<usize> {
    entries
        .iter()
        .position(|entry| entry.is_bill() && entry.key() == bill_id)
        .ok_or_else(|| LedgerError::BillNotFound(bill_id.to_string()))
}
