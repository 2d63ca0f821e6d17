use crate::{CoreError, ProductRecord, StatusFlags};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Windows MAX_PATH.
pub const MAX_PATH_LEN: usize = 260;
/// Longest product-name portion a folder name starts out with.
pub const MAX_NAME_LEN: usize = 60;
const NAME_SEPARATOR: &str = " - ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderCategory {
    Sold,
    Damaged,
    Personal,
    ToSell,
    Inventory,
}

impl FolderCategory {
    pub const ALL: [FolderCategory; 5] = [
        FolderCategory::Inventory,
        FolderCategory::ToSell,
        FolderCategory::Sold,
        FolderCategory::Damaged,
        FolderCategory::Personal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FolderCategory::Sold => "Sold",
            FolderCategory::Damaged => "Damaged",
            FolderCategory::Personal => "Personal",
            FolderCategory::ToSell => "To Sell",
            FolderCategory::Inventory => "Inventory",
        }
    }
}

/// First match wins: Sold, Damaged, Personal, then ToSell once the
/// to-sell date has arrived, otherwise Inventory.
pub fn resolve_category(
    flags: &StatusFlags,
    to_sell_after: Option<NaiveDate>,
    today: NaiveDate,
) -> FolderCategory {
    if flags.sold {
        FolderCategory::Sold
    } else if flags.damaged {
        FolderCategory::Damaged
    } else if flags.personal {
        FolderCategory::Personal
    } else if to_sell_after.map(|d| d <= today).unwrap_or(false) {
        FolderCategory::ToSell
    } else {
        FolderCategory::Inventory
    }
}

impl ProductRecord {
    pub fn category(&self, today: NaiveDate) -> FolderCategory {
        resolve_category(&self.flags, self.to_sell_after, today)
    }
}

/// The five storage roots a product folder can live in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRoots {
    pub inventory: PathBuf,
    pub sold: PathBuf,
    pub to_sell: PathBuf,
    pub damaged: PathBuf,
    pub personal: PathBuf,
}

impl FolderRoots {
    /// Damaged and Personal sit next to the inventory root.
    pub fn from_configured(inventory: PathBuf, sold: PathBuf, to_sell: PathBuf) -> Self {
        let parent = inventory
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| inventory.clone());
        Self {
            damaged: parent.join("Damaged"),
            personal: parent.join("Personal"),
            inventory,
            sold,
            to_sell,
        }
    }

    pub fn root_for(&self, category: FolderCategory) -> &Path {
        match category {
            FolderCategory::Sold => &self.sold,
            FolderCategory::Damaged => &self.damaged,
            FolderCategory::Personal => &self.personal,
            FolderCategory::ToSell => &self.to_sell,
            FolderCategory::Inventory => &self.inventory,
        }
    }

    pub fn all(&self) -> Vec<(FolderCategory, &Path)> {
        FolderCategory::ALL
            .iter()
            .map(|c| (*c, self.root_for(*c)))
            .collect()
    }

    /// Creates the derived Damaged and Personal roots if they are missing.
    pub fn ensure_derived(&self) -> Result<(), CoreError> {
        for dir in [&self.damaged, &self.personal] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                info!(path = %dir.display(), "created folder root");
            }
        }
        Ok(())
    }

    /// Category whose root contains `path`. Nested roots resolve to the deepest one.
    pub fn category_of(&self, path: &Path) -> Option<FolderCategory> {
        FolderCategory::ALL
            .into_iter()
            .filter(|c| path.starts_with(self.root_for(*c)))
            .max_by_key(|c| self.root_for(*c).components().count())
    }

    /// True when `current` is not already under the root for `target`.
    pub fn needs_move(&self, current: &Path, target: FolderCategory) -> bool {
        self.category_of(current) != Some(target)
    }
}

/// Replaces every character outside `[A-Za-z0-9 -]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Builds `base/"{id} - {name}"`, truncating the name so the path stays within
/// [`MAX_PATH_LEN`]. Lengths are counted in characters. `None` when even an
/// empty name does not fit.
pub fn shorten_path(product_id: &str, product_name: &str, base: &Path) -> Option<PathBuf> {
    let fixed = base.to_string_lossy().chars().count()
        + product_id.chars().count()
        + NAME_SEPARATOR.len();

    let mut max_name = MAX_NAME_LEN;
    loop {
        if fixed + max_name <= MAX_PATH_LEN {
            let truncated: String = product_name.chars().take(max_name).collect();
            let folder = format!("{product_id}{NAME_SEPARATOR}{truncated}");
            return Some(base.join(folder));
        }
        if max_name == 0 {
            error!(product_id, base = %base.display(), "unable to shorten folder name");
            return None;
        }
        max_name -= 1;
    }
}

/// Renames the product folder at `current` into `target_root` as
/// `"{ID} - {sanitized name}"`, returning the new absolute path.
///
/// Nothing is touched on failure: a missing root, an unshortenable name and
/// an occupied destination are all checked before the rename.
pub fn move_product_folder(
    current: &Path,
    product_id: &str,
    product_name: &str,
    target_root: &Path,
) -> Result<PathBuf, CoreError> {
    info!(from = %current.display(), to = %target_root.display(), "moving product folder");

    if !target_root.is_dir() {
        error!(root = %target_root.display(), "target folder not found");
        return Err(CoreError::MissingRoot(target_root.to_path_buf()));
    }
    if !current.is_dir() {
        return Err(CoreError::NotFound("product folder"));
    }

    let product_id = product_id.trim().to_uppercase();
    let sanitized = sanitize_name(product_name.trim());
    let new_path = shorten_path(&product_id, &sanitized, target_root).ok_or_else(|| {
        CoreError::PathTooLong {
            product_id: product_id.clone(),
            base: target_root.to_path_buf(),
        }
    })?;

    if new_path != current && new_path.exists() {
        return Err(CoreError::Conflict(format!(
            "{} already exists",
            new_path.display()
        )));
    }

    fs::rename(current, &new_path).map_err(|e| {
        error!(error = %e, from = %current.display(), "folder move failed");
        CoreError::Io(e)
    })?;
    info!(path = %new_path.display(), "folder moved");
    Ok(new_path)
}
