use crate::index::{rebuild_from_scan, FolderIndex};
use crate::{
    move_product_folder, product_id_of, CoreError, FolderCategory, FolderIndexEntry, FolderRoots,
    ProductRecord,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelocateOutcome {
    Unchanged { path: PathBuf, category: FolderCategory },
    Moved { from: PathBuf, to: PathBuf, category: FolderCategory },
}

/// Moves `entry` into `target_root` and swaps the index entry.
///
/// The index is only written after the rename succeeded. If the index write
/// fails the rename is undone.
pub async fn move_and_reindex(
    index: &dyn FolderIndex,
    entry: &FolderIndexEntry,
    product_id: &str,
    product_name: &str,
    target_root: &std::path::Path,
) -> Result<FolderIndexEntry, CoreError> {
    let new_path = move_product_folder(&entry.path, product_id, product_name, target_root)?;
    let folder = new_path
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .unwrap_or_default();
    let moved = FolderIndexEntry::new(folder, new_path);

    if let Err(e) = index.rename(&entry.folder, &moved).await {
        error!(error = %e, "index update failed, restoring folder");
        if let Err(undo) = fs::rename(&moved.path, &entry.path) {
            error!(error = %undo, path = %moved.path.display(), "could not restore folder");
        }
        return Err(e);
    }
    Ok(moved)
}

/// Puts one product's folder where its flags say it belongs.
pub async fn relocate_product(
    index: &dyn FolderIndex,
    roots: &FolderRoots,
    record: &ProductRecord,
    today: NaiveDate,
) -> Result<RelocateOutcome, CoreError> {
    let entry = index
        .find(&record.product_id)
        .await?
        .ok_or(CoreError::NotFound("folder for product"))?;

    let category = record.category(today);
    if !roots.needs_move(&entry.path, category) {
        return Ok(RelocateOutcome::Unchanged {
            path: entry.path,
            category,
        });
    }
    if matches!(category, FolderCategory::Damaged | FolderCategory::Personal) {
        roots.ensure_derived()?;
    }

    let moved = move_and_reindex(
        index,
        &entry,
        &record.product_id,
        &record.product_name,
        roots.root_for(category),
    )
    .await?;
    Ok(RelocateOutcome::Moved {
        from: entry.path,
        to: moved.path,
        category,
    })
}

#[derive(Clone, Debug, Default)]
pub struct ReconcileReport {
    pub moved: Vec<(PathBuf, PathBuf)>,
    pub unchanged: usize,
    /// Folders with no matching spreadsheet row.
    pub unmatched: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Walks the top level of every root and moves each product folder to the
/// root its spreadsheet row resolves to. Failures are collected and the pass
/// carries on; the index is rebuilt from disk at the end.
pub async fn reconcile_folders(
    index: &dyn FolderIndex,
    roots: &FolderRoots,
    records: &[ProductRecord],
    today: NaiveDate,
) -> Result<ReconcileReport, CoreError> {
    roots.ensure_derived()?;
    let by_id: HashMap<&str, &ProductRecord> = records
        .iter()
        .map(|r| (r.product_id.as_str(), r))
        .collect();

    // Listed up front so a folder moved into a later root is not visited twice.
    let mut folders: Vec<(String, PathBuf)> = Vec::new();
    for (_, root) in roots.all() {
        let Ok(read) = fs::read_dir(root) else {
            warn!(root = %root.display(), "cannot read folder root");
            continue;
        };
        for dirent in read.filter_map(|e| e.ok()) {
            let path = dirent.path();
            if path.is_dir() {
                let name = dirent.file_name().to_string_lossy().trim().to_string();
                folders.push((name, path));
            }
        }
    }

    let mut report = ReconcileReport::default();
    for (name, path) in folders {
        let id = product_id_of(&name);
        let Some(record) = by_id.get(id.as_str()) else {
            report.unmatched.push(name);
            continue;
        };

        let category = record.category(today);
        if !roots.needs_move(&path, category) {
            report.unchanged += 1;
            continue;
        }
        let entry = FolderIndexEntry::new(name.clone(), path.clone());
        match move_and_reindex(
            index,
            &entry,
            &record.product_id,
            &record.product_name,
            roots.root_for(category),
        )
        .await
        {
            Ok(moved) => report.moved.push((path, moved.path)),
            Err(e) => {
                warn!(folder = %name, error = %e, "folder not moved");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    let root_paths: Vec<PathBuf> = roots.all().into_iter().map(|(_, p)| p.to_path_buf()).collect();
    rebuild_from_scan(index, &root_paths).await?;
    info!(
        moved = report.moved.len(),
        unchanged = report.unchanged,
        failed = report.failed.len(),
        "folder reconciliation finished"
    );
    Ok(report)
}
