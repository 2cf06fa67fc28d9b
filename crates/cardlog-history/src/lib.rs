//! # cardlog-history
//!
//! Review history for the sidebar.
//!
//! This crate provides:
//! - [`HistoryLog`]: the persisted, newest-first history list, with every
//!   read-modify-write serialized behind one lock
//! - [`HistoryRecorder`]: turns a completed card review into a history entry
//! - [`RecorderWorker`]: consumes review events from the bus one at a time
//! - [`view`]: filtering, search, and incremental loading for the sidebar
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cardlog_core::{EventBus, InMemoryHost};
//! use cardlog_history::{HistoryRecorder, RecorderWorker, WorkerConfig};
//!
//! let host = Arc::new(InMemoryHost::new());
//! let recorder = Arc::new(HistoryRecorder::for_host(host));
//! let bus = EventBus::default();
//!
//! let handle = RecorderWorker::new(recorder, WorkerConfig::default()).start(&bus);
//! bus.card_reviewed("card-1");
//!
//! handle.shutdown().await?;
//! ```

pub mod log;
pub mod recorder;
pub mod view;
pub mod worker;

pub use log::HistoryLog;
pub use recorder::{HistoryRecorder, RecordOutcome};
pub use view::{empty_message, score_counts, time_since, HistoryPage, HistoryQuery};
pub use worker::{RecorderEvent, RecorderWorker, WorkerConfig, WorkerHandle};
