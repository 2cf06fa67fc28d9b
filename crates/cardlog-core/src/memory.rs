//! In-memory host for deterministic testing.
//!
//! Implements every host trait over plain maps, counts lookups, and can
//! simulate storage latency and host failures.
//!
//! ## Usage
//!
//! ```rust
//! use cardlog_core::{Card, InMemoryHost, Note, RichText, Score};
//!
//! let host = InMemoryHost::new()
//!     .with_note(Note::new("rem-a", RichText::plain("Capital of France?")))
//!     .with_card(Card::new("card-1", "rem-a").with_review(Score::Good));
//!
//! assert_eq!(host.note_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::{Card, Note};
use crate::traits::{CardStore, NoteStore, SyncedStorage};

/// In-memory implementation of [`NoteStore`], [`CardStore`], and
/// [`SyncedStorage`].
#[derive(Clone, Default)]
pub struct InMemoryHost {
    notes: Arc<RwLock<HashMap<String, Note>>>,
    cards: Arc<RwLock<HashMap<String, Card>>>,
    storage: Arc<RwLock<HashMap<String, JsonValue>>>,
    counters: Arc<Counters>,
    faults: Arc<Faults>,
    storage_latency: Duration,
}

#[derive(Default)]
struct Counters {
    note_lookups: AtomicUsize,
    storage_reads: AtomicUsize,
    storage_writes: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    notes: AtomicBool,
    storage_reads: AtomicBool,
    storage_writes: AtomicBool,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(self, note: Note) -> Self {
        self.insert_note(note);
        self
    }

    pub fn with_card(self, card: Card) -> Self {
        self.insert_card(card);
        self
    }

    /// Delay every storage read and write, widening race windows in tests.
    pub fn with_storage_latency(mut self, latency: Duration) -> Self {
        self.storage_latency = latency;
        self
    }

    pub fn insert_note(&self, note: Note) {
        self.notes.write().unwrap().insert(note.id.clone(), note);
    }

    pub fn remove_note(&self, id: &str) -> Option<Note> {
        self.notes.write().unwrap().remove(id)
    }

    pub fn insert_card(&self, card: Card) {
        self.cards.write().unwrap().insert(card.id.clone(), card);
    }

    /// Replace a stored value directly, bypassing latency and faults.
    pub fn put_value(&self, key: &str, value: JsonValue) {
        self.storage.write().unwrap().insert(key.to_string(), value);
    }

    /// Read a stored value directly, bypassing latency and faults.
    pub fn value(&self, key: &str) -> Option<JsonValue> {
        self.storage.read().unwrap().get(key).cloned()
    }

    /// Make note lookups return a host error.
    pub fn fail_note_lookups(&self, fail: bool) {
        self.faults.notes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_storage_reads(&self, fail: bool) {
        self.faults.storage_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_storage_writes(&self, fail: bool) {
        self.faults.storage_writes.store(fail, Ordering::SeqCst);
    }

    pub fn note_count(&self) -> usize {
        self.notes.read().unwrap().len()
    }

    /// Number of `find_note` calls served so far.
    pub fn note_lookups(&self) -> usize {
        self.counters.note_lookups.load(Ordering::SeqCst)
    }

    pub fn storage_reads(&self) -> usize {
        self.counters.storage_reads.load(Ordering::SeqCst)
    }

    pub fn storage_writes(&self) -> usize {
        self.counters.storage_writes.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if !self.storage_latency.is_zero() {
            tokio::time::sleep(self.storage_latency).await;
        }
    }
}

#[async_trait]
impl NoteStore for InMemoryHost {
    async fn find_note(&self, id: &str) -> Result<Option<Note>> {
        self.counters.note_lookups.fetch_add(1, Ordering::SeqCst);
        if self.faults.notes.load(Ordering::SeqCst) {
            return Err(Error::Internal(format!("simulated lookup failure for {}", id)));
        }
        Ok(self.notes.read().unwrap().get(id).cloned())
    }
}

#[async_trait]
impl CardStore for InMemoryHost {
    async fn find_card(&self, id: &str) -> Result<Option<Card>> {
        Ok(self.cards.read().unwrap().get(id).cloned())
    }
}

#[async_trait]
impl SyncedStorage for InMemoryHost {
    async fn get_synced(&self, key: &str) -> Result<Option<JsonValue>> {
        self.simulate_latency().await;
        self.counters.storage_reads.fetch_add(1, Ordering::SeqCst);
        if self.faults.storage_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("simulated read failure for {}", key)));
        }
        Ok(self.storage.read().unwrap().get(key).cloned())
    }

    async fn set_synced(&self, key: &str, value: JsonValue) -> Result<()> {
        self.simulate_latency().await;
        self.counters.storage_writes.fetch_add(1, Ordering::SeqCst);
        if self.faults.storage_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("simulated write failure for {}", key)));
        }
        self.storage.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteType, RichText};
    use serde_json::json;

    #[tokio::test]
    async fn test_find_note_counts_lookups() {
        let host = InMemoryHost::new().with_note(Note::new("rem-a", RichText::plain("A")));

        assert!(host.find_note("rem-a").await.unwrap().is_some());
        assert!(host.find_note("missing").await.unwrap().is_none());
        assert_eq!(host.note_lookups(), 2);
    }

    #[tokio::test]
    async fn test_default_parent_of_follows_parent_id() {
        let host = InMemoryHost::new()
            .with_note(Note::new("rem-p", RichText::plain("Parent")))
            .with_note(Note::new("rem-c", RichText::plain("Child")).with_parent("rem-p"));

        let child = host.find_note("rem-c").await.unwrap().unwrap();
        let parent = host.parent_of(&child).await.unwrap().unwrap();
        assert_eq!(parent.id, "rem-p");

        assert!(host.parent_of(&parent).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_type_and_slot_read_note_fields() {
        let note = Note::new("rem-d", RichText::plain("Color"))
            .with_type(NoteType::Descriptor)
            .with_slot(true);
        let host = InMemoryHost::new();

        assert_eq!(host.note_type(&note).await.unwrap(), NoteType::Descriptor);
        assert!(host.is_slot(&note).await.unwrap());
    }

    #[tokio::test]
    async fn test_note_lookup_fault() {
        let host = InMemoryHost::new().with_note(Note::new("rem-a", RichText::plain("A")));
        host.fail_note_lookups(true);
        assert!(host.find_note("rem-a").await.is_err());

        host.fail_note_lookups(false);
        assert!(host.find_note("rem-a").await.is_ok());
    }

    #[tokio::test]
    async fn test_storage_round_trip() {
        let host = InMemoryHost::new();
        assert!(host.get_synced("cardData").await.unwrap().is_none());

        host.set_synced("cardData", json!([1, 2])).await.unwrap();
        assert_eq!(host.get_synced("cardData").await.unwrap(), Some(json!([1, 2])));
        assert_eq!(host.storage_reads(), 2);
        assert_eq!(host.storage_writes(), 1);
    }

    #[tokio::test]
    async fn test_storage_write_fault_leaves_value() {
        let host = InMemoryHost::new();
        host.put_value("cardData", json!([]));
        host.fail_storage_writes(true);

        let result = host.set_synced("cardData", json!([1])).await;
        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(host.value("cardData"), Some(json!([])));
    }

    #[tokio::test]
    async fn test_card_lookup() {
        let host = InMemoryHost::new().with_card(Card::new("card-1", "rem-a"));
        let card = host.find_card("card-1").await.unwrap().unwrap();
        assert_eq!(card.note_id, "rem-a");
        assert!(host.find_card("card-2").await.unwrap().is_none());
    }
}
