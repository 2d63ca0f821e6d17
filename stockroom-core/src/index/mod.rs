use crate::{CoreError, FolderIndexEntry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub mod memory;

/// Folder name to path store used to locate product folders.
#[async_trait]
pub trait FolderIndex: Send + Sync {
    /// First entry whose folder name starts with `"{product_id} "`.
    async fn find(&self, product_id: &str) -> Result<Option<FolderIndexEntry>, CoreError>;
    async fn list(&self) -> Result<Vec<FolderIndexEntry>, CoreError>;

    async fn upsert(&self, folder: &str, path: &Path) -> Result<(), CoreError>;
    async fn delete(&self, folder: &str) -> Result<(), CoreError>;

    /// Drops `old_folder` and inserts `entry` as one step.
    async fn rename(&self, old_folder: &str, entry: &FolderIndexEntry) -> Result<(), CoreError>;
    /// Replaces the whole index; on error the previous contents stay.
    async fn replace_all(&self, entries: &[FolderIndexEntry]) -> Result<(), CoreError>;

    async fn get(&self, product_id: &str) -> Result<Option<PathBuf>, CoreError> {
        Ok(self.find(product_id).await?.map(|e| e.path))
    }
}

/// `"{ID} "`, the prefix every folder of a product starts with.
pub fn product_prefix(product_id: &str) -> String {
    format!("{} ", product_id.trim().to_uppercase())
}

/// Walks every existing root and returns one entry per directory below it.
/// Missing roots are skipped; an unreadable directory fails the whole scan.
pub fn scan_roots<P: AsRef<Path>>(roots: &[P]) -> Result<Vec<FolderIndexEntry>, CoreError> {
    let mut out = Vec::new();
    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            warn!(root = %root.display(), "skipping missing folder root");
            continue;
        }
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(|e| {
                warn!(error = %e, "directory walk failed");
                CoreError::Storage("directory walk")
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().trim().to_string();
            out.push(FolderIndexEntry::new(name, entry.path()));
        }
    }
    Ok(out)
}

/// Rescans `roots` and swaps the result into `index` wholesale.
pub async fn rebuild_from_scan<P: AsRef<Path>>(
    index: &dyn FolderIndex,
    roots: &[P],
) -> Result<usize, CoreError> {
    let entries = scan_roots(roots)?;
    index.replace_all(&entries).await?;
    info!(count = entries.len(), "folder index rebuilt");
    Ok(entries.len())
}
