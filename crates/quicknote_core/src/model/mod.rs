//! Domain model for notes.
//!
//! # Responsibility
//! - Define the canonical note record used by repository and service code.
//! - Define the command types accepted by the service layer.
//!
//! # Invariants
//! - Every note is identified by a stable, store-assigned `NoteId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod note;
