//! # cardlog-text
//!
//! Turns a note's rich text into the flat string shown in the review
//! history.
//!
//! Rich text may reference other notes, whose text may reference others in
//! turn, so resolution is recursive over the host's note graph. Every
//! top-level call is bounded (see [`ResolverConfig`]): cycles, excessive
//! depth, or an exhausted step budget contribute an empty string instead of
//! recursing forever.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cardlog_core::InMemoryHost;
//! use cardlog_text::{ResolverConfig, TextResolver};
//!
//! let host = Arc::new(InMemoryHost::new());
//! let resolver = TextResolver::new(host, ResolverConfig::default());
//! let text = resolver.resolve_id("rem-a", false).await;
//! ```

pub mod config;
mod guard;
pub mod resolver;

pub use config::ResolverConfig;
pub use resolver::TextResolver;
