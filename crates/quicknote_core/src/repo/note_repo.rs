//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide storage-level CRUD over the `notes` collection.
//! - Assign ids and timestamps at insert time.
//!
//! # Invariants
//! - Absence is reported as `None`/`false`, never as an error.
//! - A malformed id is treated the same as an unknown id.
//! - `id` and `created_at` are never written by update paths.
//! - Listing order is `created_at DESC`, newest insertion first on ties.

use crate::db::DbError;
use crate::model::note::{NewNote, Note, NoteId, NotePatch};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    created_at,
    updated_at
FROM notes";

const NOTE_COLUMNS: [&str; 5] = ["id", "title", "content", "created_at", "updated_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure raised by note repositories.
///
/// Absence is not an error here; callers get `Option`/`bool`.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "notes store is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "notes store table `{table}` is missing column `{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access contract for the notes collection.
pub trait NoteRepository {
    /// Persists a new note and returns it with store-assigned id and timestamps.
    fn insert(&self, new_note: &NewNote) -> RepoResult<Note>;
    /// Returns every note, newest `created_at` first.
    fn list_all(&self) -> RepoResult<Vec<Note>>;
    /// Returns the matching note, or `None` for unknown or malformed ids.
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Note>>;
    /// Applies supplied patch fields and returns the updated note.
    fn update_by_id(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>>;
    /// Removes the matching note; returns whether a row was deleted.
    fn delete_by_id(&self, id: &str) -> RepoResult<bool>;
}

impl<R: NoteRepository + ?Sized> NoteRepository for &R {
    fn insert(&self, new_note: &NewNote) -> RepoResult<Note> {
        (**self).insert(new_note)
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        (**self).list_all()
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Note>> {
        (**self).find_by_id(id)
    }

    fn update_by_id(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>> {
        (**self).update_by_id(id, patch)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
        (**self).delete_by_id(id)
    }
}

/// SQLite-backed notes repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - Returns `MissingRequiredTable`/`MissingRequiredColumn` when the
    ///   connection was not opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_notes_collection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert(&self, new_note: &NewNote) -> RepoResult<Note> {
        let now = now_epoch_ms();
        let note = Note {
            id: Uuid::new_v4(),
            title: new_note.title.clone(),
            content: new_note.content.clone(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO notes (
                id,
                title,
                content,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.created_at,
                note.updated_at,
            ],
        )?;

        Ok(note)
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        let sql = format!("{NOTE_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Note>> {
        let Some(note_id) = parse_note_id(id) else {
            return Ok(None);
        };
        load_note(self.conn, note_id)
    }

    fn update_by_id(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>> {
        let Some(note_id) = parse_note_id(id) else {
            return Ok(None);
        };
        if patch.is_empty() {
            return load_note(self.conn, note_id);
        }

        // Write and read-back are one statement, so a concurrent delete can
        // only make the whole update miss.
        let mut stmt = self.conn.prepare(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                updated_at = ?4
             WHERE id = ?1
             RETURNING id, title, content, created_at, updated_at;",
        )?;
        let mut rows = stmt.query(params![
            note_id.to_string(),
            patch.title.as_deref(),
            patch.content.as_deref(),
            now_epoch_ms(),
        ])?;
        match rows.next()? {
            Some(row) => parse_note_row(row).map(Some),
            None => Ok(None),
        }
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
        let Some(note_id) = parse_note_id(id) else {
            return Ok(false);
        };
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [note_id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_note_id(value: &str) -> Option<NoteId> {
    Uuid::parse_str(value.trim()).ok()
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

fn load_note(conn: &Connection, note_id: NoteId) -> RepoResult<Option<Note>> {
    let sql = format!("{NOTE_SELECT_SQL} WHERE id = ?1;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([note_id.to_string()])?;
    match rows.next()? {
        Some(row) => parse_note_row(row).map(Some),
        None => Ok(None),
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    Ok(Note {
        id: decode_stored_id(&id_text)?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn decode_stored_id(value: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid id value `{value}` in notes.id")))
}

fn ensure_notes_collection_ready(conn: &Connection) -> RepoResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(notes);")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    for column in NOTE_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}
