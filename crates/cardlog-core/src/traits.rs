//! Host collaborator traits.
//!
//! The plugin runtime owns notes, cards, and synced storage. These traits
//! are the seams cardlog reads and writes them through, so the resolver and
//! recorder can run against any host binding or against
//! [`InMemoryHost`](crate::memory::InMemoryHost) in tests.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{Card, Note, NoteType};

// =============================================================================
// NOTE LOOKUP
// =============================================================================

/// Read access to the host's note tree.
///
/// `Ok(None)` means the note does not exist (deleted or never created).
/// `Err` means the host failed to answer; callers treat both as absent.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch a note by id.
    async fn find_note(&self, id: &str) -> Result<Option<Note>>;

    /// Fetch the parent of a note, if it has one.
    async fn parent_of(&self, note: &Note) -> Result<Option<Note>> {
        match note.parent.as_deref() {
            Some(parent_id) => self.find_note(parent_id).await,
            None => Ok(None),
        }
    }

    /// Type of a note.
    async fn note_type(&self, note: &Note) -> Result<NoteType> {
        Ok(note.note_type)
    }

    /// Whether a note is a slot of its parent.
    async fn is_slot(&self, note: &Note) -> Result<bool> {
        Ok(note.is_slot)
    }
}

// =============================================================================
// CARD LOOKUP
// =============================================================================

/// Read access to the host's flashcards.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Fetch a card by id.
    async fn find_card(&self, id: &str) -> Result<Option<Card>>;
}

// =============================================================================
// SYNCED STORAGE
// =============================================================================

/// Cross-device key-value storage provided by the host.
///
/// Each call is atomic on its own; read-modify-write sequences are not, and
/// callers that need them must serialize access themselves.
#[async_trait]
pub trait SyncedStorage: Send + Sync {
    /// Read the value stored under `key`, `None` when nothing is stored.
    async fn get_synced(&self, key: &str) -> Result<Option<JsonValue>>;

    /// Replace the value stored under `key`.
    async fn set_synced(&self, key: &str, value: JsonValue) -> Result<()>;
}
