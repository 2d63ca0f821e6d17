//! Flat-file state that lives next to the inventory: settings files, the
//! default data directory, workbook backups and products-to-sell report folders.

pub mod backup;
pub mod paths;
pub mod settings;

pub use backup::*;
pub use paths::{backups_root, data_root, default_db_path};
pub use settings::{write_atomic, FolderSettings, WorkbookSettings, FOLDERS_FILE, WORKBOOK_FILE};
