//! Note use-case service.
//!
//! # Responsibility
//! - Provide the create/list/get/update/remove entry points used by adapters.
//! - Turn repository absence signals into `NoteServiceError::NotFound`.
//! - Re-check command validation before anything reaches storage.
//!
//! # Invariants
//! - This is the only layer that constructs domain errors.
//! - No state is kept between calls; each call is one repository round trip
//!   (validation failures never reach the repository).
//! - Log lines carry ids and outcome only, never note text.

use crate::model::note::{NewNote, Note, NotePatch, NoteValidationError};
use crate::repo::note_repo::{NoteRepository, RepoError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_LOG_FIELD_CHARS: usize = 64;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Command fields violate note invariants.
    Validation(NoteValidationError),
    /// No note exists for the requested id.
    NotFound(String),
    /// Persistence-layer failure, propagated as-is.
    Storage(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::NotFound(id) => write!(f, "Note with ID {id} not found"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note.
    ///
    /// # Errors
    /// - `Validation` when title/content break the length rules.
    /// - `Storage` when the insert fails.
    pub fn create(&self, command: NewNote) -> NoteServiceResult<Note> {
        if let Err(err) = command.validate() {
            warn!("event=note_create module=service status=invalid reason=\"{err}\"");
            return Err(err.into());
        }

        let note = self
            .repo
            .insert(&command)
            .inspect_err(|err| log_storage_error("note_create", err))?;
        info!(
            "event=note_create module=service status=ok note_id={}",
            note.id
        );
        Ok(note)
    }

    /// Lists all notes, newest first. An empty store yields an empty list.
    pub fn list(&self) -> NoteServiceResult<Vec<Note>> {
        let notes = self
            .repo
            .list_all()
            .inspect_err(|err| log_storage_error("note_list", err))?;
        debug!(
            "event=note_list module=service status=ok count={}",
            notes.len()
        );
        Ok(notes)
    }

    /// Gets one note by id.
    ///
    /// # Errors
    /// - `NotFound` when the id is unknown or malformed.
    pub fn get(&self, id: &str) -> NoteServiceResult<Note> {
        let found = self
            .repo
            .find_by_id(id)
            .inspect_err(|err| log_storage_error("note_get", err))?;
        found.ok_or_else(|| not_found("note_get", id))
    }

    /// Applies a partial update. Omitted fields keep their current value.
    ///
    /// An empty patch changes nothing and returns the current note.
    ///
    /// # Errors
    /// - `Validation` when a supplied field breaks the length rules.
    /// - `NotFound` when the id is unknown or malformed.
    pub fn update(&self, id: &str, patch: NotePatch) -> NoteServiceResult<Note> {
        if let Err(err) = patch.validate() {
            warn!("event=note_update module=service status=invalid reason=\"{err}\"");
            return Err(err.into());
        }

        let updated = self
            .repo
            .update_by_id(id, &patch)
            .inspect_err(|err| log_storage_error("note_update", err))?;
        let note = updated.ok_or_else(|| not_found("note_update", id))?;
        info!(
            "event=note_update module=service status=ok note_id={} noop={}",
            note.id,
            patch.is_empty()
        );
        Ok(note)
    }

    /// Deletes one note.
    ///
    /// # Errors
    /// - `NotFound` when nothing was deleted, including repeated removes.
    pub fn remove(&self, id: &str) -> NoteServiceResult<()> {
        let deleted = self
            .repo
            .delete_by_id(id)
            .inspect_err(|err| log_storage_error("note_remove", err))?;
        if !deleted {
            return Err(not_found("note_remove", id));
        }

        info!(
            "event=note_remove module=service status=ok note_id={}",
            log_field(id)
        );
        Ok(())
    }
}

fn not_found(event: &str, id: &str) -> NoteServiceError {
    warn!(
        "event={event} module=service status=not_found note_id={}",
        log_field(id)
    );
    NoteServiceError::NotFound(id.to_string())
}

/// Renders caller-supplied text as one unquoted, whitespace-free log value.
fn log_field(value: &str) -> String {
    let flattened = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_LOG_FIELD_CHARS)
        .collect::<String>();
    if flattened.is_empty() {
        "-".to_string()
    } else {
        flattened
    }
}

fn log_storage_error(event: &str, err: &RepoError) {
    error!("event={event} module=service status=error error={err}");
}
