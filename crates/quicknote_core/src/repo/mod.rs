//! Repository layer for the notes collection.
//!
//! # Responsibility
//! - Define the data-access contract consumed by the service layer.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories apply no business rules beyond storage mechanics.
//! - "Not found" is an absence signal here, never an error.

pub mod note_repo;
