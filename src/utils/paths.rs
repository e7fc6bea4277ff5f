use dirs::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".billsync";
const HOME_ENV: &str = "BILLSYNC_HOME";
const LEDGER_DIR: &str = "ledgers";
const BACKUP_DIR: &str = "backups";
const CONFIG_DIR: &str = "config";
const HISTORY_FILE: &str = "history.txt";

/// Returns the application data directory, defaulting to `~/.billsync`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(app_data_dir)
}

pub fn ledger_dir_in(base: &Path) -> PathBuf {
    base.join(LEDGER_DIR)
}

pub fn backup_dir_in(base: &Path) -> PathBuf {
    base.join(BACKUP_DIR)
}

pub fn config_dir_in(base: &Path) -> PathBuf {
    base.join(CONFIG_DIR)
}

/// Interactive shell history, kept beside the ledgers.
pub fn history_file_in(base: &Path) -> PathBuf {
    base.join(HISTORY_FILE)
}
