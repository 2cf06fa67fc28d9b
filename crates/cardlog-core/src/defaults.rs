//! Centralized default constants for cardlog.
//!
//! **This module is the single source of truth** for shared default values.
//! The resolver and history crates reference these constants instead of
//! defining their own magic numbers.

// =============================================================================
// STORAGE
// =============================================================================

/// Synced storage key holding the review history list.
///
/// Matches the key the sidebar view subscribes to, so existing histories
/// keep loading after an upgrade.
pub const HISTORY_STORAGE_KEY: &str = "cardData";

// =============================================================================
// TEXT RESOLUTION
// =============================================================================

/// Maximum nesting depth of note lookups within one top-level resolution.
pub const RESOLVE_MAX_DEPTH: usize = 32;

/// Maximum number of note resolutions performed by one top-level call.
///
/// Bounds total work on graphs that are acyclic but heavily shared, where
/// the path check alone would still allow exponential fan-out.
pub const RESOLVE_MAX_STEPS: usize = 2_048;

/// Wall-clock limit for one top-level resolution, in milliseconds.
pub const RESOLVE_TIMEOUT_MS: u64 = 5_000;

/// Separator inserted between a parent's text and a pointer or slot note.
pub const PARENT_SEPARATOR: &str = " > ";

/// Separator inserted between a parent's text and a qualified element.
pub const QUALIFIER_SEPARATOR: &str = ">";

// =============================================================================
// EVENTS / WORKER
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Recorder worker event channel capacity.
pub const WORKER_EVENT_CAPACITY: usize = 64;

// =============================================================================
// VIEW
// =============================================================================

/// Number of history entries revealed per "load more" step.
pub const HISTORY_PAGE_BATCH: usize = 20;
