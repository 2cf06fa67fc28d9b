//! Persisted review history list.
//!
//! The list lives in synced storage as a JSON array, newest entry first.
//! Every read-check-write sequence goes through one async mutex so the
//! recorder and sidebar mutations never overwrite each other.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use cardlog_core::defaults::HISTORY_STORAGE_KEY;
use cardlog_core::logging::COMPONENT_HISTORY_LOG;
use cardlog_core::{HistoryEntry, Result, Score, SyncedStorage};

/// Single-writer handle on the history list.
pub struct HistoryLog {
    storage: Arc<dyn SyncedStorage>,
    key: String,
    lock: Mutex<()>,
}

impl HistoryLog {
    /// History log under the default `cardData` key.
    pub fn new(storage: Arc<dyn SyncedStorage>) -> Self {
        Self::with_key(storage, HISTORY_STORAGE_KEY)
    }

    pub fn with_key(storage: Arc<dyn SyncedStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current list, newest first. Empty when nothing was stored yet.
    pub async fn load(&self) -> Result<Vec<HistoryEntry>> {
        self.read().await
    }

    /// Prepend `entry` unless the newest entry is already for the same note.
    ///
    /// Returns the new list length, or `None` when the entry was skipped.
    #[instrument(
        skip(self, entry),
        fields(component = COMPONENT_HISTORY_LOG, storage_key = %self.key, note_id = %entry.note_id)
    )]
    pub async fn prepend_unless_recent(&self, entry: HistoryEntry) -> Result<Option<usize>> {
        let _guard = self.lock.lock().await;
        self.prepend_locked(entry).await
    }

    /// Build and prepend an entry for a review of `note_id`.
    ///
    /// The review time is taken after the lock is held, so list order and
    /// timestamp order always agree. Returns the stored entry and the new
    /// list length, or `None` when the newest entry is already for this note.
    #[instrument(
        skip(self, question_text),
        fields(component = COMPONENT_HISTORY_LOG, storage_key = %self.key)
    )]
    pub async fn record_review(
        &self,
        note_id: &str,
        score: Option<Score>,
        question_text: String,
    ) -> Result<Option<(HistoryEntry, usize)>> {
        let _guard = self.lock.lock().await;
        let entry = HistoryEntry::new(note_id, Utc::now(), score, question_text);
        let history_len = self.prepend_locked(entry.clone()).await?;
        Ok(history_len.map(|len| (entry, len)))
    }

    /// Caller must hold `self.lock`.
    async fn prepend_locked(&self, entry: HistoryEntry) -> Result<Option<usize>> {
        let mut entries = self.read().await?;

        if entries
            .first()
            .is_some_and(|newest| newest.note_id == entry.note_id)
        {
            debug!("Newest entry already covers this note, skipping");
            return Ok(None);
        }

        entries.insert(0, entry);
        self.write(&entries).await?;
        debug!(history_len = entries.len(), "History entry prepended");
        Ok(Some(entries.len()))
    }

    /// Flip the expanded flag on the first entry for `note_id`.
    ///
    /// Returns the new flag, or `None` when no entry matched.
    pub async fn toggle_expanded(&self, note_id: &str) -> Result<Option<bool>> {
        self.update_first(note_id, |entry| {
            entry.is_expanded = !entry.is_expanded;
            entry.is_expanded
        })
        .await
    }

    /// Set the expanded flag on the first entry for `note_id`.
    pub async fn set_expanded(&self, note_id: &str, expanded: bool) -> Result<bool> {
        let updated = self
            .update_first(note_id, |entry| entry.is_expanded = expanded)
            .await?;
        Ok(updated.is_some())
    }

    /// Remove the first entry for `note_id`.
    pub async fn remove(&self, note_id: &str) -> Result<Option<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;

        let Some(index) = entries.iter().position(|e| e.note_id == note_id) else {
            return Ok(None);
        };
        let removed = entries.remove(index);
        self.write(&entries).await?;
        debug!(
            component = COMPONENT_HISTORY_LOG,
            note_id,
            history_len = entries.len(),
            "History entry removed"
        );
        Ok(Some(removed))
    }

    /// Drop every entry.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write(&[]).await?;
        debug!(component = COMPONENT_HISTORY_LOG, storage_key = %self.key, "History cleared");
        Ok(())
    }

    async fn update_first<T>(
        &self,
        note_id: &str,
        apply: impl FnOnce(&mut HistoryEntry) -> T,
    ) -> Result<Option<T>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;

        let Some(entry) = entries.iter_mut().find(|e| e.note_id == note_id) else {
            return Ok(None);
        };
        let out = apply(entry);
        self.write(&entries).await?;
        Ok(Some(out))
    }

    async fn read(&self) -> Result<Vec<HistoryEntry>> {
        match self.storage.get_synced(&self.key).await? {
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    async fn write(&self, entries: &[HistoryEntry]) -> Result<()> {
        let value = serde_json::to_value(entries)?;
        self.storage.set_synced(&self.key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cardlog_core::{Error, InMemoryHost};
    use serde_json::json;

    fn entry(note_id: &str) -> HistoryEntry {
        HistoryEntry::new(note_id, Utc::now(), Some(Score::Good), format!("q {note_id}"))
    }

    fn log() -> (Arc<InMemoryHost>, HistoryLog) {
        let host = Arc::new(InMemoryHost::new());
        let log = HistoryLog::new(host.clone());
        (host, log)
    }

    #[tokio::test]
    async fn test_load_empty_when_unset() {
        let (_, log) = log();
        assert!(log.load().await.unwrap().is_empty());
        assert_eq!(log.key(), "cardData");
    }

    #[tokio::test]
    async fn test_load_null_value() {
        let (host, log) = log();
        host.put_value("cardData", JsonValue::Null);
        assert!(log.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_value_is_error() {
        let (host, log) = log();
        host.put_value("cardData", json!({"not": "a list"}));
        let err = log.load().await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_prepend_newest_first() {
        let (_, log) = log();
        assert_eq!(log.prepend_unless_recent(entry("a")).await.unwrap(), Some(1));
        assert_eq!(log.prepend_unless_recent(entry("b")).await.unwrap(), Some(2));

        let ids: Vec<_> = log
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.note_id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_prepend_skips_when_newest_matches() {
        let (host, log) = log();
        log.prepend_unless_recent(entry("a")).await.unwrap();
        let writes = host.storage_writes();

        assert_eq!(log.prepend_unless_recent(entry("a")).await.unwrap(), None);
        assert_eq!(host.storage_writes(), writes);
        assert_eq!(log.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prepend_only_checks_newest() {
        let (_, log) = log();
        log.prepend_unless_recent(entry("a")).await.unwrap();
        log.prepend_unless_recent(entry("b")).await.unwrap();
        assert_eq!(log.prepend_unless_recent(entry("a")).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_toggle_and_set_expanded() {
        let (_, log) = log();
        log.prepend_unless_recent(entry("a")).await.unwrap();

        assert_eq!(log.toggle_expanded("a").await.unwrap(), Some(true));
        assert!(log.load().await.unwrap()[0].is_expanded);
        assert_eq!(log.toggle_expanded("a").await.unwrap(), Some(false));
        assert_eq!(log.toggle_expanded("missing").await.unwrap(), None);

        assert!(log.set_expanded("a", true).await.unwrap());
        assert!(!log.set_expanded("missing", true).await.unwrap());
        assert!(log.load().await.unwrap()[0].is_expanded);
    }

    #[tokio::test]
    async fn test_remove_first_match_and_clear() {
        let (_, log) = log();
        log.prepend_unless_recent(entry("a")).await.unwrap();
        log.prepend_unless_recent(entry("b")).await.unwrap();
        log.prepend_unless_recent(entry("a")).await.unwrap();

        let removed = log.remove("a").await.unwrap().unwrap();
        assert_eq!(removed.note_id, "a");
        let ids: Vec<_> = log
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.note_id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(log.remove("zzz").await.unwrap().is_none());

        log.clear().await.unwrap();
        assert!(log.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_stored_score_does_not_block_history() {
        let (host, log) = log();
        host.put_value(
            "cardData",
            json!([
                {"remId": "rem-x", "time": 1, "score": 3, "question": "x"},
                {"remId": "rem-y", "time": 2, "score": 1, "question": "y"}
            ]),
        );

        let scores: Vec<_> = log
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.score)
            .collect();
        assert_eq!(scores, vec![None, Some(Score::Good)]);

        assert_eq!(log.prepend_unless_recent(entry("a")).await.unwrap(), Some(3));
        assert_eq!(log.toggle_expanded("rem-y").await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_record_review_stamps_inside_lock() {
        let host = Arc::new(InMemoryHost::new().with_storage_latency(Duration::from_millis(20)));
        let log = HistoryLog::new(host.clone());

        let (first, second) = tokio::join!(
            log.record_review("a", Some(Score::Good), "qa".to_string()),
            log.record_review("b", None, "qb".to_string()),
        );
        let (first, _) = first.unwrap().unwrap();
        let (second, len) = second.unwrap().unwrap();
        assert_eq!(len, 2);

        let stored = log.load().await.unwrap();
        assert_eq!(stored[0].note_id, "b");
        assert_eq!(stored[1].note_id, "a");
        assert_eq!(stored[1].score, Some(Score::Good));
        assert_eq!(stored[1].question_text, "qa");
        // The second caller waited out the first read and write before stamping.
        assert!(second.reviewed_at_millis - first.reviewed_at_millis >= 40);
        assert!(stored[0].reviewed_at_millis >= stored[1].reviewed_at_millis);
    }

    #[tokio::test]
    async fn test_record_review_skips_same_note() {
        let (_, log) = log();
        assert!(log.record_review("a", None, String::new()).await.unwrap().is_some());
        assert!(log.record_review("a", None, String::new()).await.unwrap().is_none());
        assert_eq!(log.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let (host, log) = log();
        host.fail_storage_writes(true);
        let err = log.prepend_unless_recent(entry("a")).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
