//! Turns completed card reviews into history entries.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use cardlog_core::logging::COMPONENT_RECORDER;
use cardlog_core::{Card, CardStore, HistoryEntry, NoteId, NoteStore, Result, SyncedStorage};
use cardlog_text::{ResolverConfig, TextResolver};

use crate::log::HistoryLog;

/// What a single review did to the history list.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// A new entry was prepended.
    Recorded(HistoryEntry),
    /// The newest entry was already for this note.
    Duplicate { note_id: NoteId },
    /// The reviewed card no longer exists.
    CardMissing,
}

/// Records reviews into the [`HistoryLog`].
pub struct HistoryRecorder {
    cards: Arc<dyn CardStore>,
    resolver: TextResolver,
    log: Arc<HistoryLog>,
}

impl HistoryRecorder {
    pub fn new(cards: Arc<dyn CardStore>, resolver: TextResolver, log: Arc<HistoryLog>) -> Self {
        Self {
            cards,
            resolver,
            log,
        }
    }

    /// Recorder over a single host that provides notes, cards and storage,
    /// using default resolver limits and the default storage key.
    pub fn for_host<H>(host: Arc<H>) -> Self
    where
        H: NoteStore + CardStore + SyncedStorage + 'static,
    {
        Self::for_host_with_config(host, ResolverConfig::default())
    }

    pub fn for_host_with_config<H>(host: Arc<H>, config: ResolverConfig) -> Self
    where
        H: NoteStore + CardStore + SyncedStorage + 'static,
    {
        let notes: Arc<dyn NoteStore> = host.clone();
        let storage: Arc<dyn SyncedStorage> = host.clone();
        Self::new(
            host,
            TextResolver::new(notes, config),
            Arc::new(HistoryLog::new(storage)),
        )
    }

    /// The shared history log, for sidebar reads and mutations.
    pub fn log(&self) -> &Arc<HistoryLog> {
        &self.log
    }

    pub fn resolver(&self) -> &TextResolver {
        &self.resolver
    }

    /// Record the review of `card_id`.
    ///
    /// Card and text lookups degrade softly; only storage failures are
    /// returned as errors. The review time is taken once the history lock
    /// is held, so stored order matches timestamp order. Concurrent direct
    /// callers are stored in lock order, which need not be call order;
    /// [`RecorderWorker`](crate::RecorderWorker) handles events one at a
    /// time and so keeps bus delivery order.
    #[instrument(skip(self), fields(component = COMPONENT_RECORDER))]
    pub async fn on_card_reviewed(&self, card_id: &str) -> Result<RecordOutcome> {
        let start = Instant::now();

        let Some(card) = self.find_card(card_id).await else {
            debug!("Reviewed card not found, nothing to record");
            return Ok(RecordOutcome::CardMissing);
        };

        let score = card.last_score();
        let question_text = self.resolver.resolve_id(&card.note_id, false).await;

        match self
            .log
            .record_review(&card.note_id, score, question_text)
            .await?
        {
            Some((entry, history_len)) => {
                info!(
                    note_id = %entry.note_id,
                    score = ?entry.score,
                    history_len,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Review recorded"
                );
                Ok(RecordOutcome::Recorded(entry))
            }
            None => Ok(RecordOutcome::Duplicate {
                note_id: card.note_id,
            }),
        }
    }

    async fn find_card(&self, card_id: &str) -> Option<Card> {
        match self.cards.find_card(card_id).await {
            Ok(card) => card,
            Err(e) => {
                warn!(card_id, error = %e, "Card lookup failed, treating as missing");
                None
            }
        }
    }
}
