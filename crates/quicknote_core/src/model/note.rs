//! Note domain model and command types.
//!
//! # Responsibility
//! - Define the persisted `Note` record shape.
//! - Define create/update commands and their field-level validation.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another note.
//! - `title` has at least 3 and `content` at least 5 non-blank characters.
//! - `created_at` is set once at insert and never touched by updates.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Minimum title length, counted on the trimmed value.
pub const TITLE_MIN_CHARS: usize = 3;
/// Minimum content length, counted on the trimmed value.
pub const CONTENT_MIN_CHARS: usize = 5;

/// Stable identifier assigned by the store when a note is inserted.
pub type NoteId = Uuid;

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned id, immutable after insert.
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Refreshed by every non-empty update.
    pub updated_at: i64,
}

/// Command carrying the fields required to create a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Validates both fields against the note invariants.
    ///
    /// # Errors
    /// - Returns the first violated rule, checking `title` before `content`.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

/// Partial update command. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }

    /// Returns whether this patch supplies no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Validates supplied fields with the same rules as [`NewNote::validate`].
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(content) = self.content.as_deref() {
            validate_content(content)?;
        }
        Ok(())
    }
}

/// Field-level validation failure for note commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    TitleTooShort { min: usize, actual: usize },
    EmptyContent,
    ContentTooShort { min: usize, actual: usize },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooShort { min, actual } => write!(
                f,
                "title must be at least {min} characters long, got {actual}"
            ),
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::ContentTooShort { min, actual } => write!(
                f,
                "content must be at least {min} characters long, got {actual}"
            ),
        }
    }
}

impl Error for NoteValidationError {}

fn validate_title(title: &str) -> Result<(), NoteValidationError> {
    match trimmed_len(title) {
        0 => Err(NoteValidationError::EmptyTitle),
        actual if actual < TITLE_MIN_CHARS => Err(NoteValidationError::TitleTooShort {
            min: TITLE_MIN_CHARS,
            actual,
        }),
        _ => Ok(()),
    }
}

fn validate_content(content: &str) -> Result<(), NoteValidationError> {
    match trimmed_len(content) {
        0 => Err(NoteValidationError::EmptyContent),
        actual if actual < CONTENT_MIN_CHARS => Err(NoteValidationError::ContentTooShort {
            min: CONTENT_MIN_CHARS,
            actual,
        }),
        _ => Ok(()),
    }
}

fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}
