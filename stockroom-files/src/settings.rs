use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use stockroom_core::{CoreError, FolderRoots};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const FOLDERS_FILE: &str = "folders_paths.txt";
pub const WORKBOOK_FILE: &str = "excel_and_sheet_path.txt";

/// Configured inventory, sold and to-sell roots, one path per line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FolderSettings {
    pub inventory: PathBuf,
    pub sold: PathBuf,
    pub to_sell: Option<PathBuf>,
}

impl FolderSettings {
    /// The third line is optional.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let mut lines = text.lines().map(str::trim);
        let mut next = || lines.next().filter(|l| !l.is_empty()).map(PathBuf::from);
        let inventory = next().ok_or(CoreError::Invalid("inventory folder missing"))?;
        let sold = next().ok_or(CoreError::Invalid("sold folder missing"))?;
        let to_sell = next();
        Ok(Self {
            inventory,
            sold,
            to_sell,
        })
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}", self.inventory.display(), self.sold.display());
        if let Some(ts) = &self.to_sell {
            out.push('\n');
            out.push_str(&ts.display().to_string());
        }
        out
    }

    pub fn roots(&self) -> Result<FolderRoots, CoreError> {
        let to_sell = self
            .to_sell
            .clone()
            .ok_or(CoreError::Invalid("to-sell folder is not set"))?;
        Ok(FolderRoots::from_configured(
            self.inventory.clone(),
            self.sold.clone(),
            to_sell,
        ))
    }

    pub fn load(dir: &Path) -> Result<Option<Self>, CoreError> {
        let Some(text) = read_optional(&dir.join(FOLDERS_FILE))? else {
            warn!("{FOLDERS_FILE} not found, folder paths not loaded");
            return Ok(None);
        };
        let s = Self::parse(&text)?;
        info!(inventory = %s.inventory.display(), sold = %s.sold.display(), "folder settings loaded");
        Ok(Some(s))
    }

    pub fn save(&self, dir: &Path) -> Result<(), CoreError> {
        write_atomic(&dir.join(FOLDERS_FILE), &self.render())?;
        info!("folder settings saved");
        Ok(())
    }
}

/// Workbook path and the sheet holding the inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkbookSettings {
    pub path: PathBuf,
    pub sheet: String,
}

impl WorkbookSettings {
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let (path, sheet) = text
            .trim()
            .split_once('\n')
            .ok_or(CoreError::Invalid("workbook settings need a path and a sheet name"))?;
        let (path, sheet) = (path.trim(), sheet.trim());
        if path.is_empty() || sheet.is_empty() {
            return Err(CoreError::Invalid("workbook settings need a path and a sheet name"));
        }
        Ok(Self {
            path: PathBuf::from(path),
            sheet: sheet.to_string(),
        })
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.path.display(), self.sheet)
    }

    pub fn load(dir: &Path) -> Result<Option<Self>, CoreError> {
        match read_optional(&dir.join(WORKBOOK_FILE))? {
            Some(text) => Self::parse(&text).map(Some),
            None => {
                warn!("{WORKBOOK_FILE} not found");
                Ok(None)
            }
        }
    }

    pub fn save(&self, dir: &Path) -> Result<(), CoreError> {
        write_atomic(&dir.join(WORKBOOK_FILE), &self.render())?;
        info!(path = %self.path.display(), sheet = %self.sheet, "workbook settings saved");
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CoreError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::Io(e)),
    }
}

pub fn write_atomic(path: &Path, contents: &str) -> Result<(), CoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(FolderSettings::load(tmp.path()).unwrap(), None);

        let s = FolderSettings {
            inventory: "/data/Inventory".into(),
            sold: "/data/Sold".into(),
            to_sell: Some("/data/To Sell".into()),
        };
        s.save(tmp.path()).unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join(FOLDERS_FILE)).unwrap(),
            "/data/Inventory\n/data/Sold\n/data/To Sell"
        );
        assert_eq!(FolderSettings::load(tmp.path()).unwrap(), Some(s));
    }

    #[test]
    fn to_sell_line_is_optional() {
        let s = FolderSettings::parse("/inv\n/sold\n").unwrap();
        assert_eq!(s.to_sell, None);
        assert!(s.roots().is_err());
        assert!(FolderSettings::parse("/inv").is_err());
    }

    #[test]
    fn workbook_file_needs_two_lines() {
        let w = WorkbookSettings::parse("C:/stock/Inventory.xlsx\nSheet1\n").unwrap();
        assert_eq!(w.sheet, "Sheet1");
        assert!(WorkbookSettings::parse("only-a-path.xlsx").is_err());

        let tmp = tempfile::tempdir().unwrap();
        w.save(tmp.path()).unwrap();
        assert_eq!(WorkbookSettings::load(tmp.path()).unwrap(), Some(w));
    }
}
