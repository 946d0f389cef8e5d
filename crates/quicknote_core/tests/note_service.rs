use quicknote_core::db::open_db_in_memory;
use quicknote_core::{
    NewNote, Note, NotePatch, NoteRepository, NoteService, NoteServiceError, NoteValidationError,
    RepoError, RepoResult, SqliteNoteRepository,
};
use std::cell::{Cell, RefCell};
use uuid::Uuid;

/// In-memory stand-in for the document store with a logical clock.
#[derive(Default)]
struct FakeNoteRepository {
    notes: RefCell<Vec<Note>>,
    clock: Cell<i64>,
    calls: Cell<usize>,
}

impl FakeNoteRepository {
    fn tick(&self) -> i64 {
        self.calls.set(self.calls.get() + 1);
        self.clock.set(self.clock.get() + 1);
        self.clock.get()
    }

    fn position(&self, id: &str) -> Option<usize> {
        let id = Uuid::parse_str(id).ok()?;
        self.notes.borrow().iter().position(|note| note.id == id)
    }
}

impl NoteRepository for FakeNoteRepository {
    fn insert(&self, new_note: &NewNote) -> RepoResult<Note> {
        let now = self.tick();
        let note = Note {
            id: Uuid::new_v4(),
            title: new_note.title.clone(),
            content: new_note.content.clone(),
            created_at: now,
            updated_at: now,
        };
        self.notes.borrow_mut().push(note.clone());
        Ok(note)
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        self.calls.set(self.calls.get() + 1);
        let mut notes = self.notes.borrow().clone();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Note>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.position(id).map(|idx| self.notes.borrow()[idx].clone()))
    }

    fn update_by_id(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>> {
        let now = self.tick();
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        let mut notes = self.notes.borrow_mut();
        let note = &mut notes[idx];
        if let Some(title) = &patch.title {
            note.title = title.clone();
        }
        if let Some(content) = &patch.content {
            note.content = content.clone();
        }
        if !patch.is_empty() {
            note.updated_at = now;
        }
        Ok(Some(note.clone()))
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
        self.calls.set(self.calls.get() + 1);
        match self.position(id) {
            Some(idx) => {
                self.notes.borrow_mut().remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Repository whose store is always unreachable.
struct UnreachableRepository;

impl UnreachableRepository {
    fn failure() -> RepoError {
        RepoError::InvalidData("store unreachable".to_string())
    }
}

impl NoteRepository for UnreachableRepository {
    fn insert(&self, _new_note: &NewNote) -> RepoResult<Note> {
        Err(Self::failure())
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        Err(Self::failure())
    }

    fn find_by_id(&self, _id: &str) -> RepoResult<Option<Note>> {
        Err(Self::failure())
    }

    fn update_by_id(&self, _id: &str, _patch: &NotePatch) -> RepoResult<Option<Note>> {
        Err(Self::failure())
    }

    fn delete_by_id(&self, _id: &str) -> RepoResult<bool> {
        Err(Self::failure())
    }
}

const UNKNOWN_ID: &str = "6f1c1c8e-2b9e-4c4e-9d36-0a5b7a3f9e10";

#[test]
fn create_returns_note_with_supplied_fields() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);

    let note = service
        .create(NewNote::new("Groceries", "Milk, eggs, bread"))
        .unwrap();
    assert_eq!(note.title, "Groceries");
    assert_eq!(note.content, "Milk, eggs, bread");
    assert_eq!(service.get(&note.id.to_string()).unwrap(), note);
}

#[test]
fn create_rejects_invalid_command_without_touching_store() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);

    let err = service.create(NewNote::new("", "Test Content")).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::EmptyTitle)
    ));
    let err = service.create(NewNote::new("Title", "tiny")).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::ContentTooShort { .. })
    ));
    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn list_returns_newest_first() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);
    assert!(service.list().unwrap().is_empty());

    let a = service.create(NewNote::new("Note A", "content A")).unwrap();
    let b = service.create(NewNote::new("Note B", "content B")).unwrap();
    let c = service.create(NewNote::new("Note C", "content C")).unwrap();

    assert_eq!(service.list().unwrap(), vec![c, b, a]);
}

#[test]
fn get_unknown_or_malformed_id_is_not_found() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);

    let err = service.get(UNKNOWN_ID).unwrap_err();
    assert!(matches!(&err, NoteServiceError::NotFound(id) if id == UNKNOWN_ID));
    assert_eq!(
        err.to_string(),
        format!("Note with ID {UNKNOWN_ID} not found")
    );
    assert!(matches!(
        service.get("invalid-id"),
        Err(NoteServiceError::NotFound(_))
    ));
}

#[test]
fn update_changes_only_supplied_fields() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);
    let note = service
        .create(NewNote::new("Test Title", "Test Content"))
        .unwrap();

    let updated = service
        .update(&note.id.to_string(), NotePatch::title("Updated Title"))
        .unwrap();
    assert_eq!(updated.title, "Updated Title");
    assert_eq!(updated.content, note.content);
    assert_eq!(updated.created_at, note.created_at);
    assert!(updated.updated_at > note.updated_at);
}

#[test]
fn update_with_empty_patch_is_noop() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);
    let note = service
        .create(NewNote::new("Test Title", "Test Content"))
        .unwrap();

    let same = service
        .update(&note.id.to_string(), NotePatch::default())
        .unwrap();
    assert_eq!(same, note);
}

#[test]
fn update_missing_note_is_not_found_and_creates_nothing() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);

    let err = service
        .update(UNKNOWN_ID, NotePatch::title("Updated Title"))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(_)));
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn update_rejects_invalid_supplied_field() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);
    let note = service
        .create(NewNote::new("Test Title", "Test Content"))
        .unwrap();

    let err = service
        .update(&note.id.to_string(), NotePatch::content("   "))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::EmptyContent)
    ));
    assert_eq!(service.get(&note.id.to_string()).unwrap(), note);
}

#[test]
fn remove_twice_deletes_once_then_reports_not_found() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);
    let keep = service.create(NewNote::new("Keep", "keep this")).unwrap();
    let note = service.create(NewNote::new("Drop", "drop this")).unwrap();
    let id = note.id.to_string();

    service.remove(&id).unwrap();
    assert!(matches!(service.get(&id), Err(NoteServiceError::NotFound(_))));
    assert!(matches!(
        service.remove(&id),
        Err(NoteServiceError::NotFound(_))
    ));
    assert_eq!(service.list().unwrap(), vec![keep]);
}

#[test]
fn storage_failures_propagate_unchanged() {
    let service = NoteService::new(UnreachableRepository);

    assert!(matches!(
        service.create(NewNote::new("Test Title", "Test Content")),
        Err(NoteServiceError::Storage(RepoError::InvalidData(_)))
    ));
    assert!(matches!(
        service.list(),
        Err(NoteServiceError::Storage(_))
    ));
    assert!(matches!(
        service.get(UNKNOWN_ID),
        Err(NoteServiceError::Storage(_))
    ));
    assert!(matches!(
        service.update(UNKNOWN_ID, NotePatch::title("Updated")),
        Err(NoteServiceError::Storage(_))
    ));
    assert!(matches!(
        service.remove(UNKNOWN_ID),
        Err(NoteServiceError::Storage(_))
    ));
}

#[test]
fn groceries_scenario_against_sqlite_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let service = NoteService::new(repo);

    let created = service
        .create(NewNote::new("Groceries", "Milk, eggs, bread"))
        .unwrap();
    let id = created.id.to_string();

    let updated = service
        .update(&id, NotePatch::content("Milk, eggs"))
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Groceries");
    assert_eq!(updated.content, "Milk, eggs");
    assert_eq!(updated.created_at, created.created_at);

    service.remove(&id).unwrap();
    assert!(matches!(service.get(&id), Err(NoteServiceError::NotFound(_))));
}

#[test]
fn sqlite_store_failure_surfaces_as_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let service = NoteService::new(repo);
    conn.execute_batch("DROP TABLE notes;").unwrap();

    let err = service.list().unwrap_err();
    assert!(matches!(err, NoteServiceError::Storage(RepoError::Db(_))));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn note_serializes_with_camel_case_timestamps() {
    let repo = FakeNoteRepository::default();
    let service = NoteService::new(&repo);
    let note = service
        .create(NewNote::new("Groceries", "Milk, eggs, bread"))
        .unwrap();

    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["id"], note.id.to_string());
    assert_eq!(json["createdAt"], note.created_at);
    assert_eq!(json["updatedAt"], note.updated_at);
    assert!(json.get("created_at").is_none());

    let patch: NotePatch = serde_json::from_str(r#"{"title":"Only title"}"#).unwrap();
    assert_eq!(patch, NotePatch::title("Only title"));
}
