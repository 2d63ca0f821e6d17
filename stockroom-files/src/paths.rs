use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DB_FILE: &str = "inventory_management.db";

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "stockroom", "Stockroom") {
        pd.data_dir().to_path_buf()
    } else {
        // Fallback: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn default_db_path(settings_dir: &Path) -> PathBuf {
    settings_dir.join(DB_FILE)
}

/// `<inventory parent>/Excel Backups`, home of workbook and report backups.
pub fn backups_root(inventory_root: &Path) -> PathBuf {
    inventory_root
        .parent()
        .unwrap_or(inventory_root)
        .join("Excel Backups")
}
