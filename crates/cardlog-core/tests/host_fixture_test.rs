//! Integration tests for host payload decoding and the in-memory host.
//!
//! This test suite validates:
//! - Notes and cards decode from the JSON shapes the host hands out
//! - Default trait methods answer parent, type and slot queries from note fields
//! - Fault injection and call counters on `InMemoryHost`

use cardlog_core::{
    Card, CardStore, Error, InMemoryHost, Note, NoteStore, NoteType, RichTextElement,
    RichTextNode, Score, SyncedStorage,
};
use serde_json::json;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn fixture_host() -> InMemoryHost {
    let notes: Vec<Note> = serde_json::from_value(json!([
        {"_id": "rem-car", "text": ["Car"]},
        {"_id": "rem-color", "text": ["Color ", {"i": "q", "_id": "rem-red"}],
         "type": "descriptor", "parent": "rem-car"},
        {"_id": "rem-red", "text": ["red"], "parent": "rem-color"},
        {"_id": "rem-age", "text": ["Age"], "parent": "rem-car", "isSlot": true}
    ]))
    .expect("valid notes");
    let card: Card = serde_json::from_value(json!({
        "_id": "card-1",
        "remId": "rem-color",
        "repetitionHistory": [
            {"score": 0, "date": 1_700_000_000_000_i64},
            {"score": 1.5}
        ]
    }))
    .expect("valid card");

    let host = InMemoryHost::new().with_card(card);
    for note in notes {
        host.insert_note(note);
    }
    host
}

// ============================================================================
// DECODING
// ============================================================================

#[tokio::test]
async fn test_fixture_notes_decode() {
    let host = fixture_host();
    assert_eq!(host.note_count(), 4);

    let color = host.find_note("rem-color").await.unwrap().unwrap();
    assert_eq!(color.note_type, NoteType::Descriptor);
    assert_eq!(color.parent.as_deref(), Some("rem-car"));
    assert!(matches!(
        &color.text.elements()[1],
        RichTextElement::Node(RichTextNode::Reference { id, .. }) if id == "rem-red"
    ));
}

#[tokio::test]
async fn test_fixture_card_last_score() {
    let host = fixture_host();
    let card = host.find_card("card-1").await.unwrap().unwrap();
    assert_eq!(card.note_id, "rem-color");
    assert_eq!(card.repetition_history.len(), 2);
    assert_eq!(card.repetition_history[0].score, Some(Score::Again));
    assert_eq!(card.last_score(), Some(Score::Easy));
}

#[tokio::test]
async fn test_card_with_unknown_score_still_resolves() {
    let card: Card = serde_json::from_value(json!({
        "_id": "card-x",
        "remId": "rem-x",
        "repetitionHistory": [{"score": 0.5}, {"score": 7}]
    }))
    .expect("unknown scores decode as absent");
    let host = InMemoryHost::new().with_card(card);

    let card = host.find_card("card-x").await.unwrap().unwrap();
    assert_eq!(card.repetition_history.len(), 2);
    assert_eq!(card.repetition_history[0].score, Some(Score::Hard));
    assert_eq!(card.last_score(), None);
}

#[test]
fn test_score_itself_stays_strict() {
    assert!(serde_json::from_value::<Score>(json!(7)).is_err());
    assert!(Score::try_from(7.0).is_err());
    assert_eq!(Score::try_from(0.01).unwrap(), Score::TooEarly);
}

// ============================================================================
// DEFAULT TRAIT METHODS
// ============================================================================

#[tokio::test]
async fn test_parent_type_and_slot_queries() {
    let host = fixture_host();
    let age = host.find_note("rem-age").await.unwrap().unwrap();

    let parent = host.parent_of(&age).await.unwrap().unwrap();
    assert_eq!(parent.id, "rem-car");
    assert!(host.is_slot(&age).await.unwrap());
    assert_eq!(host.note_type(&age).await.unwrap(), NoteType::Ordinary);

    assert!(host.parent_of(&parent).await.unwrap().is_none());
}

#[tokio::test]
async fn test_parent_of_deleted_parent_is_none() {
    let host = fixture_host();
    let red = host.find_note("rem-red").await.unwrap().unwrap();
    host.remove_note("rem-color");

    assert!(host.parent_of(&red).await.unwrap().is_none());
}

// ============================================================================
// FAULTS AND COUNTERS
// ============================================================================

#[tokio::test]
async fn test_fault_injection_and_counters() {
    let host = fixture_host();

    host.find_note("rem-car").await.unwrap();
    host.fail_note_lookups(true);
    assert!(matches!(
        host.find_note("rem-car").await,
        Err(Error::Internal(_))
    ));
    assert_eq!(host.note_lookups(), 2);

    host.set_synced("cardData", json!([])).await.unwrap();
    host.fail_storage_reads(true);
    assert!(matches!(
        host.get_synced("cardData").await,
        Err(Error::Storage(_))
    ));
    assert_eq!(host.storage_reads(), 1);
    assert_eq!(host.storage_writes(), 1);
    assert_eq!(host.value("cardData"), Some(json!([])));
}
