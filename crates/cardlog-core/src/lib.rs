//! # cardlog-core
//!
//! Core types, traits, and abstractions for the cardlog review history.
//!
//! This crate provides the data contracts shared by the text resolver and
//! the history recorder: the rich-text model, notes and cards as the host
//! exposes them, the persisted history entry, and the host collaborator
//! traits that concrete plugin runtimes implement.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod memory;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventBus, ReviewEvent};
pub use memory::InMemoryHost;
pub use models::*;
pub use traits::*;
