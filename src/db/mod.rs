mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::Type, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::*;

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";

/// The note store.
///
/// Wraps a single SQLite connection shared by every clone of the handle. Each
/// operation takes the connection lock exactly once, so from a caller's point
/// of view every operation is one atomic read or write. Concurrent updates to
/// the same note are last-write-wins.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.conn()?;
        schema::run_migrations(&mut conn)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::StorageUnavailable("database lock poisoned".to_string()))
    }

    // ============================================================
    // Note operations
    // ============================================================

    /// All notes, most recently updated first.
    pub fn list_notes(&self) -> StoreResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             ORDER BY updated_at DESC, created_at DESC, id"
        ))?;

        let notes = stmt
            .query_map([], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    pub fn get_note(&self, id: Uuid) -> StoreResult<Note> {
        let conn = self.conn()?;
        select_note(&conn, id)?.ok_or_else(|| StoreError::not_found(id))
    }

    pub fn create_note(&self, input: NoteInput) -> StoreResult<Note> {
        let (title, content) = input.into_fields()?;
        let conn = self.conn()?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &title,
                &content,
                format_datetime(now),
                format_datetime(now),
            ),
        )?;
        tracing::debug!(note_id = %id, "Created note");

        Ok(Note {
            id,
            title,
            content,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace title and content of an existing note.
    pub fn update_note(&self, id: Uuid, input: NoteInput) -> StoreResult<Note> {
        let (title, content) = input.into_fields()?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let existing = select_note(&tx, id)?.ok_or_else(|| StoreError::not_found(id))?;
        let now = advance(existing.updated_at);

        tx.execute(
            "UPDATE notes SET title = ?, content = ?, updated_at = ? WHERE id = ?",
            (&title, &content, format_datetime(now), id.to_string()),
        )?;
        tx.commit()?;
        tracing::debug!(note_id = %id, "Updated note");

        Ok(Note {
            id,
            title,
            content,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    pub fn delete_note(&self, id: Uuid) -> StoreResult<DeleteConfirmation> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM notes WHERE id = ?", [id.to_string()])?;
        if rows == 0 {
            return Err(StoreError::not_found(id));
        }
        tracing::debug!(note_id = %id, "Deleted note");
        Ok(DeleteConfirmation::new(id))
    }

    pub fn count_notes(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Round-trip a trivial query to prove the database is usable.
    pub fn ping(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "notebox")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("notebox.db"))
}

fn select_note(conn: &Connection, id: Uuid) -> StoreResult<Option<Note>> {
    let note = conn
        .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"),
            [id.to_string()],
            note_from_row,
        )
        .optional()?;
    Ok(note)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: parse_uuid(0, row.get(0)?)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_datetime(3, row.get(3)?)?,
        updated_at: parse_datetime(4, row.get(4)?)?,
    })
}

/// Fixed-width RFC 3339 so that textual order in SQL is chronological order.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Next `updated_at` for a note last touched at `previous`. Never returns a
/// value at or before `previous`, even if the clock has not moved.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::nanoseconds(1)
    }
}

fn parse_uuid(idx: usize, s: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
