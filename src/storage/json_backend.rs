use chrono::{NaiveDateTime, Utc};
use std::{
    cmp::Reverse,
    collections::HashSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    errors::LedgerError,
    ledger::{BillDefinition, LedgerEntry},
    utils::paths,
};

use super::{Result, StorageBackend};

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Stores each collection as one pretty-printed JSON array under `<base>/ledgers`.
#[derive(Clone)]
pub struct JsonStorage {
    ledgers_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let base = paths::resolve_base(root);
        let ledgers_dir = paths::ledger_dir_in(&base);
        let backups_dir = paths::backup_dir_in(&base);
        fs::create_dir_all(&ledgers_dir)?;
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            ledgers_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn ledger_path(&self, key: &str) -> PathBuf {
        self.ledgers_dir
            .join(format!("{}.{}", canonical_name(key), FILE_EXTENSION))
    }

    fn backup_dir(&self, key: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(key))
    }

    pub fn backup_path(&self, key: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(key).join(backup_name)
    }

    fn write_backup(&self, key: &str, json: &str, note: Option<&str>) -> Result<String> {
        let dir = self.backup_dir(key);
        fs::create_dir_all(&dir)?;
        let stamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let label = sanitize_backup_note(note)
            .map(|label| format!("_{}", label))
            .unwrap_or_default();

        let mut name = format!("{}{}.{}", stamp, label, FILE_EXTENSION);
        let mut attempt = 1;
        while dir.join(&name).exists() {
            name = format!("{}-{}{}.{}", stamp, attempt, label, FILE_EXTENSION);
            attempt += 1;
        }
        write_atomic(&dir.join(&name), json)?;
        self.prune_backups(key)?;
        Ok(name)
    }

    fn prune_backups(&self, key: &str) -> Result<()> {
        let backups = self.list_backups(key)?;
        for stale in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_path(key, stale));
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, key: &str, entries: &[LedgerEntry]) -> Result<()> {
        let path = self.ledger_path(key);
        if path.exists() {
            let previous = fs::read_to_string(&path)?;
            self.write_backup(key, &previous, Some("autosave"))?;
        }
        save_entries_to_path(entries, &path)?;
        tracing::info!(key, entries = entries.len(), "ledger saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<LedgerEntry>> {
        let path = self.ledger_path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        load_entries_from_path(&path)
    }

    fn backup(&self, key: &str, entries: &[LedgerEntry], note: Option<&str>) -> Result<String> {
        let json = serde_json::to_string_pretty(entries)?;
        self.write_backup(key, &json, note)
    }

    fn list_backups(&self, key: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(key);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort_by(|a, b| b.cmp(a));
        names.sort_by_key(|name| Reverse(parse_backup_timestamp(name)));
        Ok(names)
    }

    fn restore(&self, key: &str, backup_name: &str) -> Result<Vec<LedgerEntry>> {
        let path = self.backup_path(key, backup_name);
        if !path.exists() {
            return Err(LedgerError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let entries = load_entries_from_path(&path)?;
        self.save(key, &entries)?;
        Ok(entries)
    }
}

/// Writes the collection to `path` by staging a sibling temporary file.
pub fn save_entries_to_path(entries: &[LedgerEntry], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_entries_from_path(path: &Path) -> Result<Vec<LedgerEntry>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Inconsistencies worth reporting after a load. None of them block loading.
pub fn entry_warnings(entries: &[LedgerEntry]) -> Vec<String> {
    let bills: Vec<&BillDefinition> = entries.iter().filter_map(LedgerEntry::as_bill).collect();
    let bill_ids: HashSet<String> = bills.iter().map(|def| def.id()).collect();
    let mut warnings = Vec::new();

    for def in &bills {
        if def.bill.due_date.is_none() {
            warnings.push(format!("bill `{}` has no due date", def.bill.name));
        }
        let mut seen = HashSet::new();
        for payment in &def.bill.payments {
            if !seen.insert(payment.occurrence_date) {
                warnings.push(format!(
                    "bill `{}` has more than one payment for {}",
                    def.bill.name, payment.occurrence_date
                ));
            }
        }
    }

    for txn in entries.iter().filter_map(LedgerEntry::as_plain) {
        if let Some(bill_id) = txn.matched_to_bill_id.as_deref() {
            if !bill_ids.contains(bill_id) {
                warnings.push(format!(
                    "transaction {} is linked to unknown bill {}",
                    txn.key(),
                    bill_id
                ));
            }
        }
    }
    warnings
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_backup_timestamp(name: &str) -> Option<NaiveDateTime> {
    let mut parts = name.splitn(3, '_');
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    let time_digits: String = time_part.chars().take(6).collect();
    NaiveDateTime::parse_from_str(&format!("{}{}", date_part, time_digits), "%Y%m%d%H%M%S").ok()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
