use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use stockroom_core::{
    move_product_folder, resolve_category, sanitize_name, shorten_path, CoreError,
    FolderCategory, FolderRoots, StatusFlags, MAX_NAME_LEN, MAX_PATH_LEN,
};
use tempfile::tempdir;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn category_precedence() {
    let today = day(2024, 6, 1);
    let past = Some(day(2024, 1, 1));

    let all = StatusFlags {
        sold: true,
        damaged: true,
        personal: true,
        ..Default::default()
    };
    assert_eq!(resolve_category(&all, past, today), FolderCategory::Sold);

    let damaged_personal = StatusFlags {
        damaged: true,
        personal: true,
        ..Default::default()
    };
    assert_eq!(resolve_category(&damaged_personal, past, today), FolderCategory::Damaged);

    let personal = StatusFlags {
        personal: true,
        ..Default::default()
    };
    assert_eq!(resolve_category(&personal, past, today), FolderCategory::Personal);
}

#[test]
fn to_sell_date_boundary() {
    let none = StatusFlags::default();
    let today = day(2024, 6, 1);
    assert_eq!(resolve_category(&none, Some(today), today), FolderCategory::ToSell);
    assert_eq!(resolve_category(&none, Some(day(2024, 6, 2)), today), FolderCategory::Inventory);
    assert_eq!(resolve_category(&none, None, today), FolderCategory::Inventory);
}

#[test]
fn sanitize_keeps_only_safe_characters() {
    assert_eq!(sanitize_name("Cable: USB/C (2m)"), "Cable_ USB_C _2m_");
    assert_eq!(sanitize_name("Lamp - Blue 3"), "Lamp - Blue 3");
    let cleaned = sanitize_name("Crème brûlée!");
    assert!(cleaned.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_'));
}

#[test]
fn short_base_keeps_sixty_characters() {
    let name = "x".repeat(100);
    let p = shorten_path("ABC1", &name, &PathBuf::from("/inv")).unwrap();
    let folder = p.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(folder, format!("ABC1 - {}", "x".repeat(MAX_NAME_LEN)));
}

#[test]
fn long_base_truncates_name_to_fit() {
    let base = PathBuf::from(format!("/{}", "d".repeat(199)));
    let name = "y".repeat(100);
    let p = shorten_path("ABC1", &name, &base).unwrap();
    let folder = p.file_name().unwrap().to_string_lossy().to_string();
    let name_len = folder.len() - "ABC1 - ".len();

    assert_eq!(200 + 4 + 3 + name_len, MAX_PATH_LEN);
    assert!(name_len < MAX_NAME_LEN);
}

#[test]
fn base_too_long_for_any_name() {
    let base = PathBuf::from(format!("/{}", "d".repeat(300)));
    assert!(shorten_path("ABC1", "thing", &base).is_none());
}

#[test]
fn empty_name_still_fits_exactly() {
    let base = PathBuf::from(format!("/{}", "d".repeat(252)));
    let p = shorten_path("ABC1", "thing", &base).unwrap();
    assert_eq!(p.file_name().unwrap().to_string_lossy(), "ABC1 - ");
}

#[test]
fn move_renames_into_target_root() {
    let tmp = tempdir().unwrap();
    let inv = tmp.path().join("Inventory");
    let sold = tmp.path().join("Sold");
    fs::create_dir_all(inv.join("abc1 - old name")).unwrap();
    fs::create_dir_all(&sold).unwrap();
    fs::write(inv.join("abc1 - old name").join("photo.jpg"), b"img").unwrap();

    let moved = move_product_folder(&inv.join("abc1 - old name"), "abc1", "Desk Lamp/Blue", &sold).unwrap();

    assert_eq!(moved, sold.join("ABC1 - Desk Lamp_Blue"));
    assert!(moved.join("photo.jpg").is_file());
    assert!(!inv.join("abc1 - old name").exists());
}

#[test]
fn move_into_missing_root_leaves_folder() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("Inventory").join("ABC1 - Lamp");
    fs::create_dir_all(&src).unwrap();

    let err = move_product_folder(&src, "ABC1", "Lamp", &tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, CoreError::MissingRoot(_)));
    assert!(src.is_dir());
}

#[test]
fn move_refuses_to_overwrite() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("Inventory").join("ABC1 - Lamp");
    let sold = tmp.path().join("Sold");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(sold.join("ABC1 - Lamp")).unwrap();

    let err = move_product_folder(&src, "ABC1", "Lamp", &sold).unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(src.is_dir());
}

#[test]
fn move_of_missing_folder_is_not_found() {
    let tmp = tempdir().unwrap();
    let sold = tmp.path().join("Sold");
    fs::create_dir_all(&sold).unwrap();

    let err = move_product_folder(&tmp.path().join("gone"), "ABC1", "Lamp", &sold).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn derived_roots_sit_beside_inventory() {
    let roots = FolderRoots::from_configured(
        PathBuf::from("/data/Inventory"),
        PathBuf::from("/data/Sold"),
        PathBuf::from("/data/To Sell"),
    );
    assert_eq!(roots.damaged, PathBuf::from("/data/Damaged"));
    assert_eq!(roots.personal, PathBuf::from("/data/Personal"));
}

#[test]
fn nested_roots_resolve_to_deepest() {
    let roots = FolderRoots::from_configured(
        PathBuf::from("/data/Inventory"),
        PathBuf::from("/data/Inventory/Sold"),
        PathBuf::from("/data/To Sell"),
    );
    let in_sold = PathBuf::from("/data/Inventory/Sold/ABC1 - Lamp");
    assert_eq!(roots.category_of(&in_sold), Some(FolderCategory::Sold));
    assert!(!roots.needs_move(&in_sold, FolderCategory::Sold));
    assert!(roots.needs_move(&in_sold, FolderCategory::Inventory));
}

#[test]
fn sanitize_replaces_one_for_one() {
    assert_eq!(sanitize_name("Widget/Thing:2"), "Widget_Thing_2");
}

#[test]
fn sixty_one_character_name_under_two_hundred_character_root() {
    let root = PathBuf::from(format!("/{}", "r".repeat(199)));
    let name = "n".repeat(61);
    let p = shorten_path("AB123", &name, &root).unwrap();
    let folder = p.file_name().unwrap().to_string_lossy().to_string();
    let kept = folder.len() - "AB123 - ".len();
    assert!(200 + 5 + 3 + kept <= MAX_PATH_LEN);
    assert_eq!(kept, 52);
}
