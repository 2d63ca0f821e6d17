use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use stockroom_core::{product_prefix, CoreError, FolderIndex, FolderIndexEntry};
use tracing::{debug, info};

/// Folder index persisted in the `folder_paths` table.
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        info!(db = %path.as_ref().display(), "folder index opened");
        let index = Self { pool };
        index.ensure_schema().await?;
        Ok(index)
    }

    /// Each pooled connection to `:memory:` is its own database, so the pool is
    /// held to a single connection.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let index = Self { pool };
        index.ensure_schema().await?;
        Ok(index)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS folder_paths (
          Folder  TEXT PRIMARY KEY,
          Path    TEXT NOT NULL
        )
        "#;
        sqlx::query(STMT)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("sqlite schema"))?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM folder_paths")
            .fetch_one(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("count folders"))?;
        Ok(row.get::<i64, _>("n"))
    }
}

#[async_trait::async_trait]
impl FolderIndex for SqliteIndex {
    async fn find(&self, product_id: &str) -> Result<Option<FolderIndexEntry>, CoreError> {
        // LIKE is case-insensitive for ASCII; wildcards in the id are matched literally.
        let pattern = format!("{}%", escape_like(&product_prefix(product_id)));
        let row = sqlx::query(
            "SELECT Folder, Path FROM folder_paths WHERE Folder LIKE ? ESCAPE '\\' ORDER BY Folder LIMIT 1",
        )
        .bind(pattern)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("read folder"))?;
        debug!(product_id, found = row.is_some(), "folder lookup");
        Ok(row.map(row_into_entry))
    }

    async fn list(&self) -> Result<Vec<FolderIndexEntry>, CoreError> {
        let rows = sqlx::query("SELECT Folder, Path FROM folder_paths ORDER BY Folder")
            .fetch_all(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("list folders"))?;
        Ok(rows.into_iter().map(row_into_entry).collect())
    }

    async fn upsert(&self, folder: &str, path: &Path) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO folder_paths (Folder, Path) VALUES (?, ?)
             ON CONFLICT(Folder) DO UPDATE SET Path = excluded.Path",
        )
        .bind(folder)
        .bind(path.to_string_lossy().to_string())
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("upsert folder"))?;
        Ok(())
    }

    async fn delete(&self, folder: &str) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM folder_paths WHERE Folder = ?")
            .bind(folder)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("delete folder"))?;
        Ok(())
    }

    async fn rename(&self, old_folder: &str, entry: &FolderIndexEntry) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        sqlx::query("DELETE FROM folder_paths WHERE Folder = ?")
            .bind(old_folder)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("delete folder"))?;

        sqlx::query(
            "INSERT INTO folder_paths (Folder, Path) VALUES (?, ?)
             ON CONFLICT(Folder) DO UPDATE SET Path = excluded.Path",
        )
        .bind(&entry.folder)
        .bind(entry.path.to_string_lossy().to_string())
        .execute(&mut *tx)
        .await
        .map_err(|_| CoreError::Storage("insert folder"))?;

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    async fn replace_all(&self, entries: &[FolderIndexEntry]) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        sqlx::query("DELETE FROM folder_paths")
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("clear folders"))?;

        for e in entries {
            // Duplicate folder names under different roots keep the last path seen.
            sqlx::query(
                "INSERT INTO folder_paths (Folder, Path) VALUES (?, ?)
                 ON CONFLICT(Folder) DO UPDATE SET Path = excluded.Path",
            )
            .bind(&e.folder)
            .bind(e.path.to_string_lossy().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("insert folder"))?;
        }

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn row_into_entry(row: sqlx::sqlite::SqliteRow) -> FolderIndexEntry {
    FolderIndexEntry::new(
        row.get::<String, _>("Folder"),
        PathBuf::from(row.get::<String, _>("Path")),
    )
}
