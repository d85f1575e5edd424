use chrono::{DateTime, SecondsFormat, Utc};
use codecanvas_core::{Vec2, clamp_scale};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub mod layout;
mod schema;

pub use layout::{EdgeLayout, EditorLayout, LAYOUT_VERSION, WorkspaceLayout};

const SCHEMA_VERSION: u32 = 1;
const WORKSPACE_COLUMNS: &str =
    "unique_id, name, camera_x, camera_y, canvas_scale, serialized_state, group_id_set, updated_at";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Workspace not found: {0}")]
    NotFound(String),
    #[error("Other error: {0}")]
    Other(String),
}

/// One saved spatial workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasWorkspace {
    pub name: String,
    pub unique_id: Uuid,
    pub camera_position: Vec2,
    pub canvas_scale: f64,
    /// Editor layout as produced by the host; opaque to storage.
    pub serialized_state: String,
    pub group_id_set: Vec<u64>,
    pub updated_at: DateTime<Utc>,
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let _ = conn.busy_timeout(Duration::from_millis(2_500));
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    pub fn new_in_memory() -> Result<Self, StorageError> {
        let storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.init()?;
        Ok(storage)
    }

    fn init(&self) -> Result<(), StorageError> {
        schema::create_tables(&self.conn)?;
        schema::apply_schema_migrations(self)
    }

    pub fn schema_version(&self) -> Result<u32, StorageError> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version.max(0) as u32)
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StorageError> {
        self.conn
            .pragma_update(None, "user_version", version.to_string())?;
        Ok(())
    }

    // ========================================================================
    // Workspaces
    // ========================================================================

    /// Inserts or replaces a workspace. Camera and scale land in the same row
    /// write, inside one transaction.
    pub fn save_workspace(&self, workspace: &CanvasWorkspace) -> Result<(), StorageError> {
        let group_ids = serde_json::to_string(&workspace.group_id_set)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO canvas_workspace (unique_id, name, camera_x, camera_y, canvas_scale, serialized_state, group_id_set, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(unique_id) DO UPDATE SET
                name = excluded.name,
                camera_x = excluded.camera_x,
                camera_y = excluded.camera_y,
                canvas_scale = excluded.canvas_scale,
                serialized_state = excluded.serialized_state,
                group_id_set = excluded.group_id_set,
                updated_at = excluded.updated_at",
            params![
                workspace.unique_id.to_string(),
                workspace.name,
                workspace.camera_position.x,
                workspace.camera_position.y,
                workspace.canvas_scale,
                workspace.serialized_state,
                group_ids,
                format_timestamp(&workspace.updated_at),
            ],
        )?;
        tx.commit()?;
        tracing::debug!("Stored workspace {} ({})", workspace.name, workspace.unique_id);
        Ok(())
    }

    pub fn get_workspace(&self, id: Uuid) -> Result<Option<CanvasWorkspace>, StorageError> {
        let sql = format!("SELECT {WORKSPACE_COLUMNS} FROM canvas_workspace WHERE unique_id = ?1");
        self.conn
            .query_row(&sql, params![id.to_string()], RawWorkspace::from_row)
            .optional()?
            .map(RawWorkspace::into_workspace)
            .transpose()
    }

    /// Most recently updated first.
    pub fn list_workspaces(&self) -> Result<Vec<CanvasWorkspace>, StorageError> {
        let sql = format!(
            "SELECT {WORKSPACE_COLUMNS} FROM canvas_workspace ORDER BY updated_at DESC, name ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut workspaces = Vec::new();
        while let Some(row) = rows.next()? {
            workspaces.push(RawWorkspace::from_row(row)?.into_workspace()?);
        }
        Ok(workspaces)
    }

    /// Returns false when no such workspace existed.
    pub fn delete_workspace(&self, id: Uuid) -> Result<bool, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM canvas_workspace WHERE unique_id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    pub fn workspace_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM canvas_workspace", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Column values as stored, before validation.
struct RawWorkspace {
    unique_id: String,
    name: String,
    camera_x: Option<f64>,
    camera_y: Option<f64>,
    canvas_scale: Option<f64>,
    serialized_state: Option<String>,
    group_id_set: Option<String>,
    updated_at: String,
}

impl RawWorkspace {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            unique_id: row.get(0)?,
            name: row.get(1)?,
            camera_x: row.get(2)?,
            camera_y: row.get(3)?,
            canvas_scale: row.get(4)?,
            serialized_state: row.get(5)?,
            group_id_set: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    /// Camera values that cannot be used are replaced rather than rejected.
    fn into_workspace(self) -> Result<CanvasWorkspace, StorageError> {
        let unique_id = Uuid::parse_str(&self.unique_id)
            .map_err(|e| StorageError::Other(format!("Invalid workspace id {}: {e}", self.unique_id)))?;
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| StorageError::Other(format!("Invalid timestamp {}: {e}", self.updated_at)))?;
        let group_id_set = match self.group_id_set.as_deref() {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(text)?,
            _ => Vec::new(),
        };
        let coordinate = |v: Option<f64>| v.filter(|v| v.is_finite()).unwrap_or(0.0);
        Ok(CanvasWorkspace {
            name: self.name,
            unique_id,
            camera_position: Vec2::new(coordinate(self.camera_x), coordinate(self.camera_y)),
            canvas_scale: clamp_scale(self.canvas_scale.unwrap_or(1.0)),
            serialized_state: self.serialized_state.unwrap_or_default(),
            group_id_set,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests;
