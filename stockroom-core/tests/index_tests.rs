use async_trait::async_trait;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use stockroom_core::index::memory::MemoryIndex;
use stockroom_core::{
    rebuild_from_scan, reconcile_folders, relocate_product, scan_roots, CoreError,
    FolderCategory, FolderIndex, FolderIndexEntry, FolderRoots, ProductRecord, RelocateOutcome,
};
use tempfile::{tempdir, TempDir};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn layout() -> (TempDir, FolderRoots) {
    let tmp = tempdir().unwrap();
    let roots = FolderRoots::from_configured(
        tmp.path().join("Inventory"),
        tmp.path().join("Sold"),
        tmp.path().join("To Sell"),
    );
    for dir in [&roots.inventory, &roots.sold, &roots.to_sell] {
        fs::create_dir_all(dir).unwrap();
    }
    (tmp, roots)
}

/// Delegates reads to a memory index but refuses renames.
struct ReadOnlyRename(MemoryIndex);

#[async_trait]
impl FolderIndex for ReadOnlyRename {
    async fn find(&self, id: &str) -> Result<Option<FolderIndexEntry>, CoreError> {
        self.0.find(id).await
    }
    async fn list(&self) -> Result<Vec<FolderIndexEntry>, CoreError> {
        self.0.list().await
    }
    async fn upsert(&self, folder: &str, path: &Path) -> Result<(), CoreError> {
        self.0.upsert(folder, path).await
    }
    async fn delete(&self, folder: &str) -> Result<(), CoreError> {
        self.0.delete(folder).await
    }
    async fn rename(&self, _: &str, _: &FolderIndexEntry) -> Result<(), CoreError> {
        Err(CoreError::Storage("rename"))
    }
    async fn replace_all(&self, entries: &[FolderIndexEntry]) -> Result<(), CoreError> {
        self.0.replace_all(entries).await
    }
}

#[tokio::test]
async fn lookup_is_by_id_prefix() {
    let idx = MemoryIndex::new();
    idx.upsert("ABC1 - Lamp", Path::new("/inv/ABC1 - Lamp")).await.unwrap();
    idx.upsert("ABC12 - Chair", Path::new("/inv/ABC12 - Chair")).await.unwrap();

    assert_eq!(idx.get("abc1").await.unwrap(), Some(PathBuf::from("/inv/ABC1 - Lamp")));
    assert_eq!(idx.get("ABC12").await.unwrap(), Some(PathBuf::from("/inv/ABC12 - Chair")));
    assert_eq!(idx.get("ABC").await.unwrap(), None);
}

#[tokio::test]
async fn rename_swaps_entry() {
    let idx = MemoryIndex::new();
    idx.upsert("ABC1 - Lamp", Path::new("/inv/ABC1 - Lamp")).await.unwrap();
    idx.rename("ABC1 - Lamp", &FolderIndexEntry::new("ABC1 - Blue Lamp", "/sold/ABC1 - Blue Lamp"))
        .await
        .unwrap();

    let all = idx.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].folder, "ABC1 - Blue Lamp");
}

#[tokio::test]
async fn scan_indexes_nested_folders_and_skips_missing_roots() {
    let (tmp, roots) = layout();
    fs::create_dir_all(roots.inventory.join("ABC1 - Lamp").join("photos")).unwrap();
    fs::create_dir_all(roots.sold.join("XYZ9 - Chair")).unwrap();
    fs::write(roots.sold.join("notes.txt"), "x").unwrap();

    let scanned = scan_roots(&[roots.inventory.clone(), roots.sold.clone(), tmp.path().join("missing")]).unwrap();
    let mut names: Vec<_> = scanned.iter().map(|e| e.folder.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["ABC1 - Lamp", "XYZ9 - Chair", "photos"]);

    let idx = MemoryIndex::new();
    idx.upsert("STALE - gone", Path::new("/nowhere")).await.unwrap();
    let n = rebuild_from_scan(&idx, &[roots.inventory.clone(), roots.sold.clone()]).await.unwrap();
    assert_eq!(n, 3);
    assert_eq!(idx.get("STALE").await.unwrap(), None);
    assert_eq!(idx.get("xyz9").await.unwrap(), Some(roots.sold.join("XYZ9 - Chair")));
}

#[tokio::test]
async fn sold_product_moves_and_index_follows() {
    let (_tmp, roots) = layout();
    let src = roots.inventory.join("ABC1 - Lamp");
    fs::create_dir_all(&src).unwrap();
    let idx = MemoryIndex::new();
    idx.upsert("ABC1 - Lamp", &src).await.unwrap();

    let mut rec = ProductRecord::new("ABC1", "Desk Lamp");
    rec.flags.sold = true;

    let out = relocate_product(&idx, &roots, &rec, today()).await.unwrap();
    let dest = roots.sold.join("ABC1 - Desk Lamp");
    assert_eq!(
        out,
        RelocateOutcome::Moved { from: src.clone(), to: dest.clone(), category: FolderCategory::Sold }
    );
    assert!(dest.is_dir());
    assert_eq!(idx.get("ABC1").await.unwrap(), Some(dest));
    assert_eq!(idx.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn folder_already_in_place_is_left_alone() {
    let (_tmp, roots) = layout();
    let src = roots.inventory.join("ABC1 - Lamp");
    fs::create_dir_all(&src).unwrap();
    let idx = MemoryIndex::new();
    idx.upsert("ABC1 - Lamp", &src).await.unwrap();

    let rec = ProductRecord::new("ABC1", "Renamed Lamp");
    let out = relocate_product(&idx, &roots, &rec, today()).await.unwrap();
    assert!(matches!(out, RelocateOutcome::Unchanged { category: FolderCategory::Inventory, .. }));
    assert!(src.is_dir());
}

#[tokio::test]
async fn damaged_root_is_created_on_demand() {
    let (_tmp, roots) = layout();
    let src = roots.inventory.join("ABC1 - Lamp");
    fs::create_dir_all(&src).unwrap();
    let idx = MemoryIndex::new();
    idx.upsert("ABC1 - Lamp", &src).await.unwrap();

    let mut rec = ProductRecord::new("ABC1", "Lamp");
    rec.flags.damaged = true;
    relocate_product(&idx, &roots, &rec, today()).await.unwrap();

    assert!(roots.damaged.join("ABC1 - Lamp").is_dir());
}

#[tokio::test]
async fn failed_move_leaves_index_untouched() {
    let (_tmp, roots) = layout();
    fs::remove_dir_all(&roots.sold).unwrap();
    let src = roots.inventory.join("ABC1 - Lamp");
    fs::create_dir_all(&src).unwrap();
    let idx = MemoryIndex::new();
    idx.upsert("ABC1 - Lamp", &src).await.unwrap();

    let mut rec = ProductRecord::new("ABC1", "Lamp");
    rec.flags.sold = true;
    let err = relocate_product(&idx, &roots, &rec, today()).await.unwrap_err();

    assert!(matches!(err, CoreError::MissingRoot(_)));
    assert!(src.is_dir());
    assert_eq!(idx.get("ABC1").await.unwrap(), Some(src));
}

#[tokio::test]
async fn index_failure_restores_folder() {
    let (_tmp, roots) = layout();
    let src = roots.inventory.join("ABC1 - Lamp");
    fs::create_dir_all(&src).unwrap();
    let idx = ReadOnlyRename(MemoryIndex::new());
    idx.upsert("ABC1 - Lamp", &src).await.unwrap();

    let mut rec = ProductRecord::new("ABC1", "Lamp");
    rec.flags.sold = true;
    assert!(relocate_product(&idx, &roots, &rec, today()).await.is_err());

    assert!(src.is_dir());
    assert!(!roots.sold.join("ABC1 - Lamp").exists());
    assert_eq!(idx.get("ABC1").await.unwrap(), Some(src));
}

#[tokio::test]
async fn unknown_product_has_no_folder() {
    let (_tmp, roots) = layout();
    let idx = MemoryIndex::new();
    let rec = ProductRecord::new("NOPE", "x");
    let err = relocate_product(&idx, &roots, &rec, today()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn reconcile_moves_every_misplaced_folder() {
    let (_tmp, roots) = layout();
    fs::create_dir_all(roots.inventory.join("ABC1 - Lamp")).unwrap();
    fs::create_dir_all(roots.inventory.join("DEF2 - Chair")).unwrap();
    fs::create_dir_all(roots.sold.join("GHI3 - Rug")).unwrap();
    fs::create_dir_all(roots.inventory.join("ZZZ9 - Orphan")).unwrap();

    let mut lamp = ProductRecord::new("ABC1", "Lamp");
    lamp.flags.sold = true;
    let chair = ProductRecord::new("DEF2", "Chair");
    let mut rug = ProductRecord::new("GHI3", "Rug");
    rug.to_sell_after = NaiveDate::from_ymd_opt(2024, 1, 1);

    let idx = MemoryIndex::new();
    let report = reconcile_folders(&idx, &roots, &[lamp, chair, rug], today()).await.unwrap();

    assert_eq!(report.moved.len(), 2);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.unmatched, vec!["ZZZ9 - Orphan".to_string()]);
    assert!(report.failed.is_empty());

    assert!(roots.sold.join("ABC1 - Lamp").is_dir());
    assert!(roots.to_sell.join("GHI3 - Rug").is_dir());
    assert_eq!(idx.get("GHI3").await.unwrap(), Some(roots.to_sell.join("GHI3 - Rug")));
    assert_eq!(idx.list().await.unwrap().len(), 4);
}
