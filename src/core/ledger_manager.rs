use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;

use crate::config::BillMatchingSettings;
use crate::core::services::{
    PaymentService, ReconciliationReport, ReconciliationService, ServiceResult,
    TransactionBillMatch, TransactionService,
};
use crate::errors::LedgerError;
use crate::ledger::{generate_occurrences, BillOccurrence, LedgerEntry, MonthWindow};
use crate::storage::{entry_warnings, StorageBackend};

/// Metadata describing the outcome of a load operation.
#[derive(Debug, Clone)]
pub struct LoadMetadata {
    pub key: Option<String>,
    pub entries: usize,
    pub warnings: Vec<String>,
}

/// Facade that coordinates the entry collection, persistence, and backups.
///
/// Every mutation swaps the held collection for the one returned by a service
/// and bumps `version`; cached occurrences from older versions are dropped.
pub struct LedgerManager {
    entries: Vec<LedgerEntry>,
    version: u64,
    current_key: Option<String>,
    storage: Box<dyn StorageBackend>,
    occurrence_cache: HashMap<(u64, MonthWindow), Vec<BillOccurrence>>,
}

impl LedgerManager {
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self {
            entries: Vec::new(),
            version: 0,
            current_key: None,
            storage,
            occurrence_cache: HashMap::new(),
        }
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    /// Installs a new collection wholesale.
    pub fn replace(&mut self, entries: Vec<LedgerEntry>) {
        self.entries = entries;
        self.version += 1;
        let version = self.version;
        self.occurrence_cache.retain(|(cached, _), _| *cached == version);
    }

    pub fn load(&mut self, key: &str) -> Result<LoadMetadata, LedgerError> {
        let entries = self.storage.load(key)?;
        self.current_key = Some(key.to_string());
        Ok(self.apply_load(entries))
    }

    pub fn import(&mut self, path: &Path) -> Result<LoadMetadata, LedgerError> {
        let entries = self.storage.load_from_path(path)?;
        Ok(self.apply_load(entries))
    }

    pub fn export(&self, path: &Path) -> Result<(), LedgerError> {
        self.storage.save_to_path(&self.entries, path)?;
        tracing::info!(path = %path.display(), entries = self.entries.len(), "ledger exported");
        Ok(())
    }

    pub fn save(&self) -> Result<(), LedgerError> {
        let key = self.require_key()?;
        self.storage.save(key, &self.entries)
    }

    pub fn save_as(&mut self, key: &str) -> Result<(), LedgerError> {
        self.storage.save(key, &self.entries)?;
        self.current_key = Some(key.to_string());
        Ok(())
    }

    pub fn backup(&self, note: Option<&str>) -> Result<String, LedgerError> {
        let key = self.require_key()?;
        self.storage.backup(key, &self.entries, note)
    }

    pub fn list_backups(&self) -> Result<Vec<String>, LedgerError> {
        let key = self.require_key()?;
        self.storage.list_backups(key)
    }

    pub fn restore(&mut self, backup_name: &str) -> Result<LoadMetadata, LedgerError> {
        let key = self.require_key()?.to_string();
        let entries = self.storage.restore(&key, backup_name)?;
        tracing::info!(key = %key, backup = backup_name, "ledger restored from backup");
        Ok(self.apply_load(entries))
    }

    pub fn add_entry(&mut self, entry: LedgerEntry) -> String {
        let (updated, key) = TransactionService::add(&self.entries, entry);
        self.replace(updated);
        key
    }

    pub fn remove(&mut self, key: &str) -> ServiceResult<LedgerEntry> {
        let (updated, removed) = TransactionService::remove(&self.entries, key)?;
        self.replace(updated);
        Ok(removed)
    }

    /// Occurrences for `window`, computed once per collection version.
    pub fn occurrences(&mut self, window: MonthWindow) -> &[BillOccurrence] {
        let entries = &self.entries;
        self.occurrence_cache
            .entry((self.version, window))
            .or_insert_with(|| generate_occurrences(entries, window))
    }

    pub fn reconcile(
        &mut self,
        window: MonthWindow,
        settings: &BillMatchingSettings,
    ) -> ReconciliationReport {
        let report = ReconciliationService::reconcile_with_report(&self.entries, window, settings);
        if !report.applied.is_empty() {
            self.replace(report.entries.clone());
        }
        report
    }

    pub fn suggestions(
        &self,
        window: MonthWindow,
        settings: &BillMatchingSettings,
    ) -> Vec<TransactionBillMatch> {
        ReconciliationService::suggest_matches(&self.entries, window, settings)
    }

    pub fn manual_match(
        &mut self,
        transaction_id: &str,
        bill_id: &str,
        occurrence_date: NaiveDate,
        tolerance: f64,
    ) -> ServiceResult<()> {
        let updated = PaymentService::manual_match(
            &self.entries,
            transaction_id,
            bill_id,
            occurrence_date,
            tolerance,
        )?;
        self.replace(updated);
        Ok(())
    }

    pub fn unmatch(&mut self, transaction_id: &str) -> ServiceResult<()> {
        let updated = PaymentService::unmatch(&self.entries, transaction_id)?;
        self.replace(updated);
        Ok(())
    }

    pub fn mark_paid(&mut self, bill_id: &str, occurrence_date: NaiveDate) -> ServiceResult<()> {
        let updated = PaymentService::mark_paid(&self.entries, bill_id, occurrence_date)?;
        self.replace(updated);
        Ok(())
    }

    pub fn clear_payment(&mut self, bill_id: &str, occurrence_date: NaiveDate) -> ServiceResult<()> {
        let updated = PaymentService::clear_payment(&self.entries, bill_id, occurrence_date)?;
        self.replace(updated);
        Ok(())
    }

    /// Converts legacy paid dates on every bill into structured payments.
    pub fn migrate_legacy_payments(&mut self) -> usize {
        let legacy: usize = self
            .entries
            .iter()
            .filter_map(LedgerEntry::as_bill)
            .map(|def| def.bill.paid_dates.len())
            .sum();
        if legacy > 0 {
            let updated = PaymentService::migrate_legacy_payments(&self.entries);
            self.replace(updated);
        }
        legacy
    }

    fn require_key(&self) -> Result<&str, LedgerError> {
        self.current_key
            .as_deref()
            .ok_or_else(|| LedgerError::Storage("no ledger loaded; use `load <name>` first".into()))
    }

    fn apply_load(&mut self, entries: Vec<LedgerEntry>) -> LoadMetadata {
        let warnings = entry_warnings(&entries);
        for warning in &warnings {
            tracing::warn!(%warning, "ledger inconsistency");
        }
        let count = entries.len();
        self.replace(entries);
        LoadMetadata {
            key: self.current_key.clone(),
            entries: count,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BillDefinition, Frequency, Transaction};
    use crate::storage::JsonStorage;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn manager_in(dir: &Path) -> LedgerManager {
        let storage = JsonStorage::new(Some(dir.to_path_buf()), Some(3)).unwrap();
        LedgerManager::new(Box::new(storage))
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());
        manager.add_entry(
            BillDefinition::new("Rent", 1200.0, date(2024, 1, 1), Frequency::Monthly)
                .with_id("rent")
                .into(),
        );
        manager.save_as("household").unwrap();

        let mut reopened = manager_in(temp.path());
        let metadata = reopened.load("household").unwrap();
        assert_eq!(metadata.entries, 1);
        assert!(metadata.warnings.is_empty());
        assert_eq!(reopened.entries(), manager.entries());
    }

    #[test]
    fn save_without_key_is_rejected() {
        let temp = tempdir().unwrap();
        let manager = manager_in(temp.path());
        assert!(matches!(manager.save(), Err(LedgerError::Storage(_))));
    }

    #[test]
    fn occurrence_cache_follows_version() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());
        let march = MonthWindow::new(2024, 3).unwrap();
        assert!(manager.occurrences(march).is_empty());

        let before = manager.version();
        manager.add_entry(
            BillDefinition::new("Gym", 30.0, date(2024, 1, 15), Frequency::Monthly).into(),
        );
        assert!(manager.version() > before);
        assert_eq!(manager.occurrences(march).len(), 1);
        assert_eq!(manager.occurrence_cache.len(), 1);
    }

    #[test]
    fn reconcile_replaces_entries_only_when_something_matched() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());
        manager.add_entry(
            BillDefinition::new("Netflix", 15.49, date(2024, 1, 5), Frequency::Monthly)
                .with_id("netflix")
                .into(),
        );
        manager.add_entry(
            Transaction::new(date(2024, 3, 5), "NETFLIX.COM", -15.49)
                .with_id("t1")
                .into(),
        );
        let settings = BillMatchingSettings::default();
        let march = MonthWindow::new(2024, 3).unwrap();

        let report = manager.reconcile(march, &settings);
        assert_eq!(report.applied.len(), 1);
        let version = manager.version();

        let again = manager.reconcile(march, &settings);
        assert!(again.applied.is_empty());
        assert_eq!(manager.version(), version);
    }
}
