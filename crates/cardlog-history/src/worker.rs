//! Review event worker.
//!
//! Subscribes to the [`EventBus`] and records each review in delivery order.
//! Events are handled one at a time so prepends follow event order.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use cardlog_core::defaults::WORKER_EVENT_CAPACITY;
use cardlog_core::logging::COMPONENT_WORKER;
use cardlog_core::{CardId, Error, EventBus, NoteId, Result, ReviewEvent};

use crate::recorder::{HistoryRecorder, RecordOutcome};

/// Configuration for the recorder worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether review events are recorded at all.
    pub enabled: bool,
    /// Buffer size of the worker's own event channel.
    pub event_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_capacity: WORKER_EVENT_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CARDLOG_WORKER_ENABLED` | `true` | Enable/disable history recording |
    /// | `CARDLOG_WORKER_EVENT_CAPACITY` | `64` | Worker event channel size |
    pub fn from_env() -> Self {
        let enabled = std::env::var("CARDLOG_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let event_capacity = std::env::var("CARDLOG_WORKER_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(WORKER_EVENT_CAPACITY)
            .max(1);

        Self {
            enabled,
            event_capacity,
        }
    }

    /// Enable or disable recording.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Event emitted by the recorder worker.
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Worker started.
    WorkerStarted,
    /// A review produced a new history entry.
    EntryRecorded {
        event_id: Uuid,
        card_id: CardId,
        note_id: NoteId,
    },
    /// The newest entry already covered the reviewed note.
    DuplicateSkipped {
        event_id: Uuid,
        card_id: CardId,
        note_id: NoteId,
    },
    /// The reviewed card could not be found.
    CardMissing { event_id: Uuid, card_id: CardId },
    /// The history list could not be read or written.
    RecordFailed {
        event_id: Uuid,
        card_id: CardId,
        error: String,
    },
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
///
/// Dropping the handle also stops the worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<RecorderEvent>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to stop once the current event is handled.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_rx.resubscribe()
    }

    /// Wait for the worker task to finish.
    pub async fn join(self) -> Result<()> {
        let Self {
            shutdown_tx, task, ..
        } = self;
        // Keep the shutdown channel open until the task exits on its own.
        let result = task.await;
        drop(shutdown_tx);
        result.map_err(|e| Error::Internal(format!("Recorder worker panicked: {e}")))
    }
}

/// Worker that records review events into the history log.
pub struct RecorderWorker {
    recorder: Arc<HistoryRecorder>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<RecorderEvent>,
}

impl RecorderWorker {
    pub fn new(recorder: Arc<HistoryRecorder>, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            recorder,
            config,
            event_tx,
        }
    }

    /// Subscribe to `bus` and start processing in a background task.
    ///
    /// The subscription is taken before this returns, so events emitted
    /// afterwards are never missed.
    pub fn start(self, bus: &EventBus) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();
        let mut reviews = bus.subscribe();

        let task = tokio::spawn(async move {
            self.run(&mut reviews, &mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
            task,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    #[instrument(skip_all, fields(component = COMPONENT_WORKER))]
    async fn run(
        &self,
        reviews: &mut broadcast::Receiver<ReviewEvent>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) {
        if !self.config.enabled {
            info!("Recorder worker is disabled, not starting");
            return;
        }

        info!("Recorder worker started");
        let _ = self.event_tx.send(RecorderEvent::WorkerStarted);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Recorder worker received shutdown signal");
                    break;
                }
                received = reviews.recv() => match received {
                    Ok(event) => self.handle(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Recorder worker lagged, review events dropped");
                    }
                    Err(RecvError::Closed) => {
                        info!("Event bus closed");
                        break;
                    }
                },
            }
        }

        let _ = self.event_tx.send(RecorderEvent::WorkerStopped);
        info!("Recorder worker stopped");
    }

    #[instrument(
        skip(self, event),
        fields(event_id = %event.event_id, card_id = %event.card_id)
    )]
    async fn handle(&self, event: ReviewEvent) {
        let start = Instant::now();
        let ReviewEvent {
            event_id, card_id, ..
        } = event;

        let out = match self.recorder.on_card_reviewed(&card_id).await {
            Ok(RecordOutcome::Recorded(entry)) => {
                debug!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Review event handled"
                );
                RecorderEvent::EntryRecorded {
                    event_id,
                    card_id,
                    note_id: entry.note_id,
                }
            }
            Ok(RecordOutcome::Duplicate { note_id }) => {
                debug!(%note_id, "Duplicate review skipped");
                RecorderEvent::DuplicateSkipped {
                    event_id,
                    card_id,
                    note_id,
                }
            }
            Ok(RecordOutcome::CardMissing) => RecorderEvent::CardMissing { event_id, card_id },
            Err(e) => {
                error!(error = %e, "Failed to record review");
                RecorderEvent::RecordFailed {
                    event_id,
                    card_id,
                    error: e.to_string(),
                }
            }
        };

        let _ = self.event_tx.send(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.event_capacity, WORKER_EVENT_CAPACITY);
    }

    #[test]
    fn test_worker_config_builders() {
        let config = WorkerConfig::default()
            .with_enabled(false)
            .with_event_capacity(0);
        assert!(!config.enabled);
        assert_eq!(config.event_capacity, 1);
    }
}
