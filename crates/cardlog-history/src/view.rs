//! Sidebar queries over the history list.
//!
//! Everything here is pure: callers load the list from [`HistoryLog`] and
//! pass the entries in.
//!
//! [`HistoryLog`]: crate::HistoryLog

use chrono::{DateTime, Utc};

use cardlog_core::defaults::HISTORY_PAGE_BATCH;
use cardlog_core::{HistoryEntry, Score};

/// Score filter plus free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Only entries with this score, when set.
    pub score: Option<Score>,
    /// Case-insensitive substring of the question text. Empty matches all.
    pub search: String,
}

/// One incrementally loaded slice of the filtered list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage<'a> {
    pub entries: Vec<&'a HistoryEntry>,
    /// Filtered entries not yet loaded.
    pub unloaded: usize,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, score: Option<Score>) -> Self {
        self.score = score;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Select `score`, or clear the filter when it is already selected.
    pub fn toggle_score(&mut self, score: Score) {
        self.score = if self.score == Some(score) {
            None
        } else {
            Some(score)
        };
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if self.score.is_some() && entry.score != self.score {
            return false;
        }
        self.search.is_empty()
            || entry
                .question_text
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    /// Matching entries, in list order.
    pub fn filter<'a>(&self, entries: &'a [HistoryEntry]) -> Vec<&'a HistoryEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }

    /// The first `batches` batches of matching entries.
    pub fn visible<'a>(
        &self,
        entries: &'a [HistoryEntry],
        batches: usize,
    ) -> Vec<&'a HistoryEntry> {
        self.page(entries, batches).entries
    }

    /// Matching entries beyond the first `batches` batches.
    pub fn unloaded(&self, entries: &[HistoryEntry], batches: usize) -> usize {
        self.page(entries, batches).unloaded
    }

    pub fn page<'a>(&self, entries: &'a [HistoryEntry], batches: usize) -> HistoryPage<'a> {
        let mut matching = self.filter(entries);
        let limit = batches.saturating_mul(HISTORY_PAGE_BATCH);
        let unloaded = matching.len().saturating_sub(limit);
        matching.truncate(limit);
        HistoryPage {
            entries: matching,
            unloaded,
        }
    }
}

/// Per-score totals over the whole list, in display order.
pub fn score_counts(entries: &[HistoryEntry]) -> [(Score, usize); 5] {
    Score::ALL.map(|score| {
        let count = entries.iter().filter(|e| e.score == Some(score)).count();
        (score, count)
    })
}

/// Placeholder shown when the filtered list is empty.
pub fn empty_message(score: Option<Score>) -> String {
    match score {
        Some(score) => format!("No flashcards with score {}.", score.label()),
        None => "No flashcards in history.".to_string(),
    }
}

/// Relative age of a review, e.g. "5 minutes ago".
///
/// Times in the future read as "just now".
pub fn time_since(reviewed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let secs = (now - reviewed_at).num_seconds();
    let (n, unit) = match secs {
        s if s < MINUTE => return "just now".to_string(),
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < MONTH => (s / DAY, "day"),
        s if s < YEAR => (s / MONTH, "month"),
        s => (s / YEAR, "year"),
    };

    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(note_id: &str, score: Option<Score>, question: &str) -> HistoryEntry {
        HistoryEntry::new(note_id, Utc::now(), score, question)
    }

    fn sample() -> Vec<HistoryEntry> {
        vec![
            entry("a", Some(Score::Good), "What is 2+2?"),
            entry("b", Some(Score::Again), "Capital of France"),
            entry("c", Some(Score::Good), "Boiling point of water"),
            entry("d", None, ""),
        ]
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let entries = sample();
        assert_eq!(HistoryQuery::new().filter(&entries).len(), 4);
    }

    #[test]
    fn test_score_filter() {
        let entries = sample();
        let ids: Vec<_> = HistoryQuery::new()
            .with_score(Some(Score::Good))
            .filter(&entries)
            .into_iter()
            .map(|e| e.note_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let entries = sample();
        let query = HistoryQuery::new().with_search("FRANCE");
        let hits = query.filter(&entries);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, "b");
    }

    #[test]
    fn test_search_and_score_combine() {
        let entries = sample();
        let query = HistoryQuery::new()
            .with_score(Some(Score::Again))
            .with_search("water");
        assert!(query.filter(&entries).is_empty());
    }

    #[test]
    fn test_toggle_score() {
        let mut query = HistoryQuery::new();
        query.toggle_score(Score::Hard);
        assert_eq!(query.score, Some(Score::Hard));
        query.toggle_score(Score::Easy);
        assert_eq!(query.score, Some(Score::Easy));
        query.toggle_score(Score::Easy);
        assert_eq!(query.score, None);
    }

    #[test]
    fn test_incremental_loading() {
        let entries: Vec<_> = (0..45)
            .map(|i| entry(&format!("n{i}"), Some(Score::Good), "q"))
            .collect();
        let query = HistoryQuery::new();

        assert_eq!(query.visible(&entries, 1).len(), 20);
        assert_eq!(query.unloaded(&entries, 1), 25);
        assert_eq!(query.visible(&entries, 2).len(), 40);
        assert_eq!(query.unloaded(&entries, 3), 0);
        assert_eq!(query.visible(&entries, 3).len(), 45);
        assert_eq!(query.visible(&entries, 0).len(), 0);

        let page = query.page(&entries, 1);
        assert_eq!(page.entries[0].note_id, "n0");
        assert_eq!(page.entries[19].note_id, "n19");
    }

    #[test]
    fn test_score_counts_in_display_order() {
        let counts = score_counts(&sample());
        assert_eq!(
            counts,
            [
                (Score::TooEarly, 0),
                (Score::Again, 1),
                (Score::Hard, 0),
                (Score::Good, 2),
                (Score::Easy, 0),
            ]
        );
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(empty_message(None), "No flashcards in history.");
        assert_eq!(
            empty_message(Some(Score::TooEarly)),
            "No flashcards with score Too Early."
        );
    }

    #[test]
    fn test_time_since() {
        let now = Utc::now();
        assert_eq!(time_since(now, now), "just now");
        assert_eq!(time_since(now + Duration::seconds(30), now), "just now");
        assert_eq!(time_since(now - Duration::seconds(59), now), "just now");
        assert_eq!(time_since(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_since(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_since(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_since(now - Duration::days(1), now), "1 day ago");
        assert_eq!(time_since(now - Duration::days(65), now), "2 months ago");
        assert_eq!(time_since(now - Duration::days(800), now), "2 years ago");
    }
}
