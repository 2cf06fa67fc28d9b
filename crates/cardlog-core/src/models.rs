//! Core data models for cardlog.
//!
//! These types mirror the host's JSON shapes so they can be read from and
//! written to synced storage without a translation layer.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// Host identifier of a note.
pub type NoteId = String;

/// Host identifier of a flashcard.
pub type CardId = String;

// =============================================================================
// RICH TEXT
// =============================================================================

/// Ordered sequence of inline elements making up a note's body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextElement>);

impl RichText {
    pub fn new(elements: Vec<RichTextElement>) -> Self {
        Self(elements)
    }

    /// Rich text made of a single literal string.
    pub fn plain(text: impl Into<String>) -> Self {
        Self(vec![RichTextElement::Text(text.into())])
    }

    pub fn elements(&self) -> &[RichTextElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The only element, when the text has exactly one.
    pub fn single(&self) -> Option<&RichTextElement> {
        match self.0.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

impl From<Vec<RichTextElement>> for RichText {
    fn from(elements: Vec<RichTextElement>) -> Self {
        Self(elements)
    }
}

impl FromIterator<RichTextElement> for RichText {
    fn from_iter<I: IntoIterator<Item = RichTextElement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One inline element: either a literal string or a typed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RichTextElement {
    Text(String),
    Node(RichTextNode),
}

impl RichTextElement {
    pub fn text(text: impl Into<String>) -> Self {
        RichTextElement::Text(text.into())
    }

    /// Reference to another note with no alias and no deleted-text fallback.
    pub fn reference(id: impl Into<NoteId>) -> Self {
        RichTextElement::Node(RichTextNode::Reference {
            id: id.into(),
            alias_id: None,
            text_of_deleted: None,
        })
    }
}

impl From<&str> for RichTextElement {
    fn from(text: &str) -> Self {
        RichTextElement::Text(text.to_string())
    }
}

impl From<RichTextNode> for RichTextElement {
    fn from(node: RichTextNode) -> Self {
        RichTextElement::Node(node)
    }
}

/// Typed inline node, discriminated by the host's `i` field.
///
/// Discriminants this crate does not know decode to [`RichTextNode::Unknown`]
/// so that new host element kinds never break history recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "i")]
pub enum RichTextNode {
    /// Reference to another note.
    #[serde(rename = "q")]
    Reference {
        #[serde(rename = "_id")]
        id: NoteId,
        #[serde(rename = "aliasId", default, skip_serializing_if = "Option::is_none")]
        alias_id: Option<NoteId>,
        /// Snapshot of the target's text, used once the target is deleted.
        #[serde(
            rename = "textOfDeletedRem",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        text_of_deleted: Option<RichText>,
    },
    /// Formatted or linked inline text.
    #[serde(rename = "m")]
    MarkLink {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "i")]
    Image {
        #[serde(default)]
        url: String,
    },
    #[serde(rename = "a")]
    Attachment {
        #[serde(default)]
        url: String,
    },
    #[serde(rename = "p")]
    PdfLink {
        #[serde(default)]
        url: String,
    },
    #[serde(rename = "g")]
    Group {
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// LaTeX and other externally rendered text.
    #[serde(rename = "x")]
    ExternalText {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "n")]
    PlainNode {
        #[serde(default)]
        text: String,
    },
    /// Styling marker that carries no visible text.
    #[serde(rename = "s")]
    Styling {},
    #[serde(other)]
    Unknown,
}

// =============================================================================
// NOTES
// =============================================================================

/// Note type as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    Ordinary,
    Concept,
    /// Property-like note whose name only makes sense next to its parent.
    Descriptor,
    Portal,
}

/// A note as read from the host. Read-only from cardlog's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: NoteId,
    #[serde(default)]
    pub text: RichText,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NoteId>,
    #[serde(default)]
    pub is_slot: bool,
}

impl Note {
    pub fn new(id: impl Into<NoteId>, text: impl Into<RichText>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            note_type: NoteType::Ordinary,
            parent: None,
            is_slot: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NoteId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_type(mut self, note_type: NoteType) -> Self {
        self.note_type = note_type;
        self
    }

    pub fn with_slot(mut self, is_slot: bool) -> Self {
        self.is_slot = is_slot;
        self
    }
}

// =============================================================================
// CARDS
// =============================================================================

/// Recall score given to a card in the review queue.
///
/// Persisted as the host's numeric interaction score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Score {
    TooEarly,
    Again,
    Hard,
    Good,
    Easy,
}

impl Score {
    /// All scores in display order.
    pub const ALL: [Score; 5] = [
        Score::TooEarly,
        Score::Again,
        Score::Hard,
        Score::Good,
        Score::Easy,
    ];

    /// Numeric value used by the host.
    pub fn value(self) -> f64 {
        match self {
            Score::TooEarly => 0.01,
            Score::Again => 0.0,
            Score::Hard => 0.5,
            Score::Good => 1.0,
            Score::Easy => 1.5,
        }
    }

    pub fn from_value(value: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|score| (score.value() - value).abs() < 1e-9)
    }

    /// Human-readable label shown next to score filters.
    pub fn label(self) -> &'static str {
        match self {
            Score::TooEarly => "Too Early",
            Score::Again => "Again",
            Score::Hard => "Hard",
            Score::Good => "Good",
            Score::Easy => "Easy",
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.value()
    }
}

impl TryFrom<f64> for Score {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Score::from_value(value)
            .ok_or_else(|| Error::InvalidInput(format!("unknown interaction score: {}", value)))
    }
}

/// Host score that may be missing or unrecognized.
///
/// Stored rows and card payloads come from other plugin versions, so a
/// value outside [`Score::ALL`] reads as absent instead of failing the
/// whole document.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<Score>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let score = raw.as_ref().and_then(|v| v.as_f64()).and_then(Score::from_value);
    if score.is_none() {
        if let Some(value) = raw.filter(|v| !v.is_null()) {
            tracing::debug!(%value, "Unrecognized interaction score, treating as absent");
        }
    }
    Ok(score)
}

/// One past review of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionRecord {
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<Score>,
    /// Review time in epoch milliseconds, when the host reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
}

/// A flashcard as read from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: CardId,
    /// Note the card was generated from.
    #[serde(rename = "remId")]
    pub note_id: NoteId,
    #[serde(default)]
    pub repetition_history: Vec<RepetitionRecord>,
}

impl Card {
    pub fn new(id: impl Into<CardId>, note_id: impl Into<NoteId>) -> Self {
        Self {
            id: id.into(),
            note_id: note_id.into(),
            repetition_history: Vec::new(),
        }
    }

    /// Append a review with the given score.
    pub fn with_review(mut self, score: Score) -> Self {
        self.repetition_history.push(RepetitionRecord {
            score: Some(score),
            date: None,
        });
        self
    }

    /// Score of the most recent review, if the card was ever reviewed and
    /// that review's score is known.
    pub fn last_score(&self) -> Option<Score> {
        self.repetition_history.last().and_then(|record| record.score)
    }
}

// =============================================================================
// HISTORY
// =============================================================================

/// One row of the review history list.
///
/// Field names on the wire match the sidebar's persisted schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Random list key for the view. Carries no meaning.
    #[serde(default)]
    pub key: f64,
    #[serde(rename = "remId")]
    pub note_id: NoteId,
    #[serde(rename = "open", default)]
    pub is_expanded: bool,
    #[serde(rename = "time")]
    pub reviewed_at_millis: i64,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<Score>,
    #[serde(rename = "question", default)]
    pub question_text: String,
}

impl HistoryEntry {
    /// New collapsed entry with a fresh random key.
    pub fn new(
        note_id: impl Into<NoteId>,
        reviewed_at: DateTime<Utc>,
        score: Option<Score>,
        question_text: impl Into<String>,
    ) -> Self {
        Self {
            key: rand::random::<f64>(),
            note_id: note_id.into(),
            is_expanded: false,
            reviewed_at_millis: reviewed_at.timestamp_millis(),
            score,
            question_text: question_text.into(),
        }
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.reviewed_at_millis).single()
    }
}
