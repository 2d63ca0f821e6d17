use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use stockroom_core::CoreError;
use tracing::{error, info, warn};

use crate::paths::backups_root;

pub const MAX_BACKUPS: usize = 100;
pub const WORKBOOK_BACKUP_DIR: &str = "Inventory Management Backups";
pub const REPORT_BACKUP_DIR: &str = "Products to Sell Reports Backup";
pub const REPORT_FOLDER_PREFIX: &str = "- See products added on ";
pub const REPORT_FILE_PREFIX: &str = "Products To Sell - ";

/// Deletes the oldest entries of `dir` (by name, which starts with a
/// timestamp) until at most `keep` remain. Returns how many were removed.
pub fn prune_oldest(dir: &Path, keep: usize) -> Result<usize, CoreError> {
    let mut names: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    names.sort();
    let excess = names.len().saturating_sub(keep);
    for p in &names[..excess] {
        fs::remove_file(p)?;
        info!(file = %p.display(), "deleted oldest backup");
    }
    Ok(excess)
}

/// Copies the workbook to
/// `<inventory parent>/Excel Backups/Inventory Management Backups/Backup of YYYY-MM-DD - HH-MM-SS.xlsx`.
pub fn backup_workbook(
    workbook: &Path,
    inventory_root: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf, CoreError> {
    if !workbook.is_file() {
        error!(path = %workbook.display(), "workbook missing, backup aborted");
        return Err(CoreError::NotFound("workbook"));
    }
    let dir = backups_root(inventory_root).join(WORKBOOK_BACKUP_DIR);
    fs::create_dir_all(&dir)?;
    prune_oldest(&dir, MAX_BACKUPS - 1)?;

    let target = dir.join(format!("Backup of {}.xlsx", now.format("%Y-%m-%d - %H-%M-%S")));
    fs::copy(workbook, &target)?;
    info!(path = %target.display(), "workbook backed up");
    Ok(target)
}

/// Renames an existing `"- See products added on …"` folder in the to-sell
/// root to today's name, or creates it.
pub fn prepare_report_folder(to_sell_root: &Path, today: NaiveDate) -> Result<PathBuf, CoreError> {
    if !to_sell_root.is_dir() {
        return Err(CoreError::MissingRoot(to_sell_root.to_path_buf()));
    }
    let target = to_sell_root.join(format!("{REPORT_FOLDER_PREFIX}{}", today.format("%Y-%m-%d")));

    let existing = fs::read_dir(to_sell_root)?
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().starts_with(REPORT_FOLDER_PREFIX));
    match existing {
        Some(e) if e.path() != target => {
            fs::rename(e.path(), &target)?;
            info!(from = %e.path().display(), to = %target.display(), "report folder renamed");
        }
        Some(_) => {}
        None => {
            fs::create_dir_all(&target)?;
            info!(path = %target.display(), "report folder created");
        }
    }
    Ok(target)
}

pub fn report_file_name(day: NaiveDate) -> String {
    format!("{REPORT_FILE_PREFIX}{}.xlsx", day.format("%Y-%m-%d"))
}

fn report_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_prefix(REPORT_FILE_PREFIX)?.strip_suffix(".xlsx")?;
    match NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(file = file_name, error = %e, "unreadable report date");
            None
        }
    }
}

fn latest_in(dir: &Path, before: NaiveDate) -> Option<(PathBuf, NaiveDate)> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let date = report_date(&e.file_name().to_string_lossy())?;
            (date < before).then(|| (e.path(), date))
        })
        .max_by_key(|(_, d)| *d)
}

/// Most recent report older than `today`, looked up in the current report
/// folder first and then among the archived reports.
pub fn latest_previous_report(
    report_folder: &Path,
    inventory_root: &Path,
    today: NaiveDate,
) -> Option<(PathBuf, NaiveDate)> {
    let found = latest_in(report_folder, today)
        .or_else(|| latest_in(&backups_root(inventory_root).join(REPORT_BACKUP_DIR), today));
    match &found {
        Some((p, _)) => info!(path = %p.display(), "previous report found"),
        None => info!("no previous report found"),
    }
    found
}

/// Moves every other `.xlsx` in the report folder into the report backup
/// directory, keeping that directory at [`MAX_BACKUPS`] files.
pub fn archive_old_reports(
    report_folder: &Path,
    new_report: &Path,
    inventory_root: &Path,
) -> Result<usize, CoreError> {
    let dir = backups_root(inventory_root).join(REPORT_BACKUP_DIR);
    fs::create_dir_all(&dir)?;
    prune_oldest(&dir, MAX_BACKUPS - 1)?;

    let mut moved = 0;
    for e in fs::read_dir(report_folder)?.filter_map(|e| e.ok()) {
        let path = e.path();
        let is_xlsx = path.extension().and_then(|x| x.to_str()) == Some("xlsx");
        if !is_xlsx || path == new_report {
            continue;
        }
        let dest = dir.join(e.file_name());
        if fs::rename(&path, &dest).is_err() {
            // rename cannot cross filesystems
            fs::copy(&path, &dest)?;
            fs::remove_file(&path)?;
        }
        info!(file = %dest.display(), "moved report to backup");
        moved += 1;
    }
    Ok(moved)
}
