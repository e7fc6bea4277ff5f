#![allow(dead_code)]

use std::sync::Mutex;

use billsync_core::{
    config::ConfigManager, core::LedgerManager, ledger::LedgerEntry, storage::JsonStorage,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates isolated managers backed by unique directories for each test.
pub fn setup_test_env() -> (LedgerManager, ConfigManager) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let storage = JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage backend");
    let ledger_manager = LedgerManager::new(Box::new(storage));
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");

    (ledger_manager, config_manager)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn bill<'a>(entries: &'a [LedgerEntry], id: &str) -> &'a billsync_core::ledger::BillDefinition {
    entries
        .iter()
        .filter_map(LedgerEntry::as_bill)
        .find(|def| def.id() == id)
        .expect("bill present")
}

pub fn txn<'a>(entries: &'a [LedgerEntry], id: &str) -> &'a billsync_core::ledger::Transaction {
    entries
        .iter()
        .filter_map(LedgerEntry::as_plain)
        .find(|txn| txn.key() == id)
        .expect("transaction present")
}
