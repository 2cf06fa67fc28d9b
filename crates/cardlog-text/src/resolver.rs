//! Rich-text resolver.
//!
//! ## Resolution Rules
//!
//! For a note:
//! 1. A body that is a single reference or mark-link is a pointer: the
//!    result is `parent + " > " + target`.
//! 2. Otherwise each element is mapped to a string and the results are
//!    concatenated in order. With `qualify`, references get a
//!    `parent>` prefix, and so do literal text elements of descriptor notes.
//! 3. Slot notes are wrapped as `parent + " > " + body`.
//!
//! References to missing notes fall back to the snapshot text the host keeps
//! on the reference (`textOfDeletedRem`).
//!
//! ## Error Handling
//!
//! Resolution never fails. Missing notes, host errors, unknown element
//! kinds, cycles, and limit trips all contribute an empty string.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, instrument, trace, warn};

use cardlog_core::defaults::{PARENT_SEPARATOR, QUALIFIER_SEPARATOR};
use cardlog_core::logging::COMPONENT_RESOLVER;
use cardlog_core::{Note, NoteStore, NoteType, RichText, RichTextElement, RichTextNode};

use crate::config::ResolverConfig;
use crate::guard::Guard;

/// Resolves notes and rich text into flat display strings.
#[derive(Clone)]
pub struct TextResolver {
    notes: Arc<dyn NoteStore>,
    config: ResolverConfig,
}

impl TextResolver {
    pub fn new(notes: Arc<dyn NoteStore>, config: ResolverConfig) -> Self {
        Self { notes, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Display text of `note`.
    ///
    /// With `qualify`, referenced and descriptor text is prefixed with the
    /// parent's name so the result reads unambiguously out of context.
    #[instrument(skip(self, note), fields(component = COMPONENT_RESOLVER, note_id = %note.id))]
    pub async fn resolve_text(&self, note: &Note, qualify: bool) -> String {
        let guard = Guard::new(&self.config);
        let fut = self.resolve_note(note.clone(), qualify, guard.clone());
        self.bounded(fut, &guard).await
    }

    /// Display text of the note with id `note_id`, empty when it does not
    /// exist.
    pub async fn resolve_id(&self, note_id: &str, qualify: bool) -> String {
        match self.find(note_id).await {
            Some(note) => self.resolve_text(&note, qualify).await,
            None => String::new(),
        }
    }

    /// Display text of a rich-text value detached from any note.
    ///
    /// Applies the per-element mapping only: no descriptor qualification and
    /// no slot wrapping. With `show_alias`, references that carry an alias
    /// resolve the alias instead of their target.
    #[instrument(skip(self, text), fields(component = COMPONENT_RESOLVER, elements = text.len()))]
    pub async fn process_rich_text(&self, text: &RichText, show_alias: bool) -> String {
        let guard = Guard::new(&self.config);
        let fut = self.rich_text(text, show_alias, guard.clone());
        self.bounded(fut, &guard).await
    }

    /// Run a top-level resolution under the configured timeout.
    async fn bounded(&self, fut: BoxFuture<'_, String>, guard: &Guard) -> String {
        let start = Instant::now();
        let text = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(text) => text,
                Err(_) => {
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        steps = guard.steps(),
                        "Resolution timed out"
                    );
                    String::new()
                }
            },
            None => fut.await,
        };
        trace!(
            steps = guard.steps(),
            duration_ms = start.elapsed().as_millis() as u64,
            len = text.len(),
            "Resolved text"
        );
        text
    }

    fn resolve_note(&self, note: Note, qualify: bool, guard: Guard) -> BoxFuture<'_, String> {
        async move {
            let Some(guard) = guard.enter(&note.id) else {
                return String::new();
            };

            if let Some(pointer) = note.text.single() {
                match pointer {
                    RichTextElement::Node(RichTextNode::Reference {
                        id,
                        text_of_deleted,
                        ..
                    }) => {
                        let (parent, target) = futures::join!(
                            self.parent_text(&note, false, guard.clone()),
                            self.reference_text(id, text_of_deleted.as_ref(), false, guard.clone()),
                        );
                        return format!("{}{}{}", parent, PARENT_SEPARATOR, target);
                    }
                    RichTextElement::Node(RichTextNode::MarkLink { text }) => {
                        let parent = self.parent_text(&note, false, guard.clone()).await;
                        return format!("{}{}{}", parent, PARENT_SEPARATOR, text);
                    }
                    _ => {}
                }
            }

            let descriptor = qualify && self.note_type(&note).await == NoteType::Descriptor;
            let parts = join_all(note.text.elements().iter().map(|element| {
                self.element_text(&note, element, qualify, descriptor, guard.clone())
            }))
            .await;
            let body = parts.concat();

            if self.is_slot(&note).await {
                let parent = self.parent_text(&note, false, guard).await;
                return format!("{}{}{}", parent, PARENT_SEPARATOR, body);
            }
            body
        }
        .boxed()
    }

    /// Map one element of a live note's body.
    fn element_text<'a>(
        &'a self,
        note: &'a Note,
        element: &'a RichTextElement,
        qualify: bool,
        descriptor: bool,
        guard: Guard,
    ) -> BoxFuture<'a, String> {
        async move {
            trace!(note_id = %note.id, depth = guard.depth(), "Resolving element");
            match element {
                RichTextElement::Text(text) => {
                    self.descriptor_text(note, text, descriptor, guard).await
                }
                RichTextElement::Node(node) => match node {
                    RichTextNode::Reference {
                        id,
                        text_of_deleted,
                        ..
                    } => {
                        let target = self
                            .reference_text(id, text_of_deleted.as_ref(), false, guard.clone())
                            .await;
                        if qualify {
                            let parent = self.parent_text(note, true, guard).await;
                            format!("{}{}{}", parent, QUALIFIER_SEPARATOR, target)
                        } else {
                            target
                        }
                    }
                    RichTextNode::MarkLink { text }
                    | RichTextNode::ExternalText { text }
                    | RichTextNode::PlainNode { text } => {
                        self.descriptor_text(note, text, descriptor, guard).await
                    }
                    other => leaf_text(other),
                },
            }
        }
        .boxed()
    }

    /// Literal text, prefixed with the parent's name on descriptor notes.
    async fn descriptor_text(
        &self,
        note: &Note,
        text: &str,
        descriptor: bool,
        guard: Guard,
    ) -> String {
        if descriptor {
            let parent = self.parent_text(note, false, guard).await;
            format!("{}{}{}", parent, QUALIFIER_SEPARATOR, text)
        } else {
            text.to_string()
        }
    }

    fn rich_text<'a>(
        &'a self,
        text: &'a RichText,
        show_alias: bool,
        guard: Guard,
    ) -> BoxFuture<'a, String> {
        async move {
            let parts = join_all(text.elements().iter().map(|element| {
                self.detached_element_text(element, show_alias, guard.clone())
            }))
            .await;
            parts.concat()
        }
        .boxed()
    }

    /// Map one element of a rich-text value that has no owning note.
    fn detached_element_text<'a>(
        &'a self,
        element: &'a RichTextElement,
        show_alias: bool,
        guard: Guard,
    ) -> BoxFuture<'a, String> {
        async move {
            match element {
                RichTextElement::Text(text) => text.clone(),
                RichTextElement::Node(RichTextNode::Reference {
                    id,
                    alias_id,
                    text_of_deleted,
                }) => {
                    let target = match alias_id {
                        Some(alias) if show_alias => alias.as_str(),
                        _ => id.as_str(),
                    };
                    self.reference_text(target, text_of_deleted.as_ref(), show_alias, guard)
                        .await
                }
                RichTextElement::Node(other) => leaf_text(other),
            }
        }
        .boxed()
    }

    /// Text of a referenced note, or of its deleted-text snapshot when the
    /// note no longer exists.
    fn reference_text<'a>(
        &'a self,
        note_id: &'a str,
        text_of_deleted: Option<&'a RichText>,
        show_alias: bool,
        guard: Guard,
    ) -> BoxFuture<'a, String> {
        async move {
            if let Some(target) = self.find(note_id).await {
                return self.resolve_note(target, false, guard).await;
            }
            match text_of_deleted {
                Some(snapshot) => {
                    debug!(note_id, "Reference target missing, using deleted-text snapshot");
                    self.rich_text(snapshot, show_alias, guard).await
                }
                None => String::new(),
            }
        }
        .boxed()
    }

    fn parent_text<'a>(
        &'a self,
        note: &'a Note,
        qualify: bool,
        guard: Guard,
    ) -> BoxFuture<'a, String> {
        async move {
            match self.notes.parent_of(note).await {
                Ok(Some(parent)) => self.resolve_note(parent, qualify, guard).await,
                Ok(None) => String::new(),
                Err(e) => {
                    warn!(note_id = %note.id, error = %e, "Parent lookup failed");
                    String::new()
                }
            }
        }
        .boxed()
    }

    async fn find(&self, note_id: &str) -> Option<Note> {
        match self.notes.find_note(note_id).await {
            Ok(note) => note,
            Err(e) => {
                warn!(note_id, error = %e, "Note lookup failed");
                None
            }
        }
    }

    async fn note_type(&self, note: &Note) -> NoteType {
        self.notes.note_type(note).await.unwrap_or_else(|e| {
            warn!(note_id = %note.id, error = %e, "Note type lookup failed");
            NoteType::default()
        })
    }

    async fn is_slot(&self, note: &Note) -> bool {
        self.notes.is_slot(note).await.unwrap_or_else(|e| {
            warn!(note_id = %note.id, error = %e, "Slot lookup failed");
            false
        })
    }
}

/// Text of elements that never recurse.
fn leaf_text(node: &RichTextNode) -> String {
    match node {
        RichTextNode::Image { url }
        | RichTextNode::Attachment { url }
        | RichTextNode::PdfLink { url } => url.clone(),
        RichTextNode::Group { id } => id.clone().unwrap_or_default(),
        RichTextNode::MarkLink { text }
        | RichTextNode::ExternalText { text }
        | RichTextNode::PlainNode { text } => text.clone(),
        RichTextNode::Reference { .. } | RichTextNode::Styling {} | RichTextNode::Unknown => {
            String::new()
        }
    }
}
