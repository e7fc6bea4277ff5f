pub mod json_backend;

use std::path::Path;

use crate::{errors::LedgerError, ledger::LedgerEntry};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Persistence for whole entry collections, one collection per key.
pub trait StorageBackend: Send + Sync {
    fn save(&self, key: &str, entries: &[LedgerEntry]) -> Result<()>;
    /// Loads the collection stored under `key`; an unknown key yields an empty collection.
    fn load(&self, key: &str) -> Result<Vec<LedgerEntry>>;
    fn backup(&self, key: &str, entries: &[LedgerEntry], note: Option<&str>) -> Result<String>;
    fn list_backups(&self, key: &str) -> Result<Vec<String>>;
    fn restore(&self, key: &str, backup_name: &str) -> Result<Vec<LedgerEntry>>;

    fn save_to_path(&self, entries: &[LedgerEntry], path: &Path) -> Result<()> {
        json_backend::save_entries_to_path(entries, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<Vec<LedgerEntry>> {
        json_backend::load_entries_from_path(path)
    }
}

pub use json_backend::{entry_warnings, JsonStorage};
