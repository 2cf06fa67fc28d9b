//! Structured logging schema for cardlog.
//!
//! All crates log through `tracing` with the same field names so output can
//! be queried consistently across the resolver and the recorder.
//!
//! ## Field Names
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `component` | One of the component values below |
//! | `event_id` | Review event id (UUIDv7) |
//! | `card_id` | Card id from a review event |
//! | `note_id` | Note being resolved or recorded |
//! | `storage_key` | Synced storage key being read or written |
//! | `depth` | Resolver recursion depth at a decision point |
//! | `steps` | Resolver steps consumed by a top-level call |
//! | `history_len` | Entries in the history list after a write |
//! | `duration_ms` | Wall-clock duration in milliseconds |
//! | `error` | Error message when an operation fails |
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Storage failures, the history could not be updated |
//! | WARN  | Recoverable issue, soft fallback applied (host error, guard trip) |
//! | INFO  | Worker lifecycle, recorded entries |
//! | DEBUG | Decision points (dedup skip, deleted-reference fallback) |
//! | TRACE | Per-element resolution detail |

/// `component` value for the rich-text resolver.
pub const COMPONENT_RESOLVER: &str = "resolver";

/// `component` value for the history recorder.
pub const COMPONENT_RECORDER: &str = "recorder";

/// `component` value for the review event worker.
pub const COMPONENT_WORKER: &str = "worker";

/// `component` value for history list mutations.
pub const COMPONENT_HISTORY_LOG: &str = "history_log";
