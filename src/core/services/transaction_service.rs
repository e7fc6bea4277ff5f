//! Business logic helpers for adding and removing ledger entries.

use crate::core::services::payment_service::drop_payments_paid_on;
use crate::core::services::ServiceResult;
use crate::errors::LedgerError;
use crate::ledger::LedgerEntry;

/// Copy-on-write CRUD helpers over the entry collection.
pub struct TransactionService;

impl TransactionService {
    /// Appends an entry, returning the new collection and the entry's key.
    pub fn add(entries: &[LedgerEntry], entry: LedgerEntry) -> (Vec<LedgerEntry>, String) {
        let key = entry.key();
        let mut updated = entries.to_vec();
        updated.push(entry);
        (updated, key)
    }

    /// Removes the entry identified by `key`. Transactions that were paying a removed
    /// bill lose their link, and a removed linked transaction takes its payment with it.
    pub fn remove(entries: &[LedgerEntry], key: &str) -> ServiceResult<(Vec<LedgerEntry>, LedgerEntry)> {
        let index = entries
            .iter()
            .position(|entry| entry.key() == key)
            .ok_or_else(|| LedgerError::TransactionNotFound(key.to_string()))?;
        let mut updated = entries.to_vec();
        let removed = updated.remove(index);
        match &removed {
            LedgerEntry::Bill(_) => {
                for txn in updated.iter_mut().filter_map(LedgerEntry::as_plain_mut) {
                    if txn.matched_to_bill_id.as_deref() == Some(key) {
                        txn.clear_bill_link();
                    }
                }
            }
            LedgerEntry::Transaction(txn) => {
                if let Some(bill_id) = txn.matched_to_bill_id.as_deref() {
                    drop_payments_paid_on(&mut updated, bill_id, txn.date);
                }
            }
        }
        Ok((updated, removed))
    }

    pub fn find<'a>(entries: &'a [LedgerEntry], key: &str) -> Option<&'a LedgerEntry> {
        entries.iter().find(|entry| entry.key() == key)
    }

    /// Entries the primary ledger view shows: bill payments linked to a bill are hidden.
    pub fn visible(entries: &[LedgerEntry]) -> Vec<&LedgerEntry> {
        entries
            .iter()
            .filter(|entry| !entry.transaction().hidden_as_bill_payment)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BillDefinition, BillPayment, Frequency, Transaction};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn remove_fails_for_missing_entry() {
        let err = TransactionService::remove(&[], "nope").expect_err("must fail for unknown key");
        assert!(matches!(err, LedgerError::TransactionNotFound(ref key) if key == "nope"));
    }

    #[test]
    fn removing_a_bill_releases_linked_transactions() {
        let mut txn = Transaction::new(date(2024, 2, 1), "RENT", -900.0).with_id("t");
        txn.link_to_bill("rent");
        let entries: Vec<LedgerEntry> = vec![
            BillDefinition::new("Rent", 900.0, date(2024, 1, 1), Frequency::Monthly)
                .with_id("rent")
                .into(),
            txn.into(),
        ];
        assert_eq!(TransactionService::visible(&entries).len(), 1);

        let (updated, removed) = TransactionService::remove(&entries, "rent").unwrap();
        assert!(removed.is_bill());
        assert!(!updated[0].transaction().is_matched());
        assert_eq!(TransactionService::visible(&updated).len(), 1);
    }

    #[test]
    fn removing_a_linked_transaction_frees_its_occurrence() {
        let mut txn = Transaction::new(date(2024, 2, 11), "ELECTRIC CO", -52.0).with_id("t1");
        txn.link_to_bill("electric");
        let mut electric = BillDefinition::new("Electric", 50.0, date(2024, 1, 10), Frequency::Monthly)
            .with_id("electric");
        electric.bill.payments.push(BillPayment::from_transaction(date(2024, 2, 10), &txn, false));
        electric.bill.payments.push(BillPayment {
            occurrence_date: date(2024, 3, 10),
            transaction_date: date(2024, 3, 9),
            transaction_amount: -50.0,
            transaction_description: "ELECTRIC CO".into(),
            manually_marked: false,
        });
        let entries: Vec<LedgerEntry> = vec![electric.into(), txn.into()];

        let (updated, removed) = TransactionService::remove(&entries, "t1").unwrap();
        assert!(!removed.is_bill());
        let payments = &updated[0].as_bill().unwrap().bill.payments;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].occurrence_date, date(2024, 3, 10));
    }
}
