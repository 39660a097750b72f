//! Exact-then-fuzzy matching of user input against the command table.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, trace};

use super::normalize;
use super::table::{CommandEntry, CommandTable};

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Normalized input equals an entry's input.
    Exact,
    /// Best similarity score cleared the threshold.
    Fuzzy,
    /// Nothing cleared the threshold.
    None,
}

/// Outcome of matching one utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    /// The matched entry, if any.
    pub entry: Option<&'a CommandEntry>,
    /// Similarity in `0.0..=1.0`; `1.0` for exact matches.
    pub confidence: f64,
    /// How the entry was found.
    pub kind: MatchKind,
}

impl<'a> MatchResult<'a> {
    fn exact(entry: &'a CommandEntry) -> Self {
        Self {
            entry: Some(entry),
            confidence: 1.0,
            kind: MatchKind::Exact,
        }
    }

    fn fuzzy(entry: &'a CommandEntry, confidence: f64) -> Self {
        Self {
            entry: Some(entry),
            confidence,
            kind: MatchKind::Fuzzy,
        }
    }

    fn no_match(confidence: f64) -> Self {
        Self {
            entry: None,
            confidence,
            kind: MatchKind::None,
        }
    }

    /// Whether an entry was matched.
    pub fn matched(&self) -> bool {
        self.entry.is_some()
    }
}

/// A ranked near-miss, used for "did you mean" hints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion<'a> {
    pub entry: &'a CommandEntry,
    pub score: f64,
}

/// Matches raw input against a command table.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    /// Minimum similarity for a fuzzy match.
    threshold: f64,
}

impl Matcher {
    /// Default minimum similarity for a fuzzy match.
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    /// Create a matcher with the given fuzzy threshold.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Match raw input against the table.
    ///
    /// Tries an exact lookup first. Otherwise every entry is scored and the
    /// best one is returned if it clears the threshold; ties go to the entry
    /// inserted first. Unmatched input is a normal result, never an error.
    pub fn match_input<'a>(&self, table: &'a CommandTable, raw: &str) -> MatchResult<'a> {
        let input = normalize(raw);
        if input.is_empty() {
            return MatchResult::no_match(0.0);
        }

        if let Some(entry) = table.lookup_exact(&input) {
            debug!(input = %input, "Exact match");
            return MatchResult::exact(entry);
        }

        let mut best: Option<(&CommandEntry, f64)> = None;
        for entry in table.entries() {
            let score = similarity(&input, &entry.input);
            trace!(candidate = %entry.input, score, "Fuzzy candidate");
            // Strictly greater keeps the earliest entry on ties.
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) if score >= self.threshold => {
                debug!(input = %input, matched = %entry.input, score, "Fuzzy match");
                MatchResult::fuzzy(entry, score)
            }
            Some((_, score)) => {
                debug!(input = %input, best_score = score, "No match above threshold");
                MatchResult::no_match(score)
            }
            None => MatchResult::no_match(0.0),
        }
    }

    /// Rank entries by similarity to the input.
    ///
    /// Returns at most `limit` entries with a positive score, highest first,
    /// keeping table order on ties.
    pub fn suggest<'a>(
        &self,
        table: &'a CommandTable,
        raw: &str,
        limit: usize,
    ) -> Vec<Suggestion<'a>> {
        let input = normalize(raw);
        if input.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<Suggestion<'a>> = table
            .entries()
            .iter()
            .filter_map(|entry| {
                let score = similarity(&input, &entry.input);
                if score > 0.0 {
                    Some(Suggestion { entry, score })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(limit);
        results
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

/// Similarity of two normalized phrases in `0.0..=1.0`.
///
/// The larger of the edit-distance similarity and the word overlap, so
/// both typos ("wether") and reordered words ("lights turn on") score high.
pub fn similarity(a: &str, b: &str) -> f64 {
    edit_similarity(a, b).max(token_overlap(a, b))
}

/// `1 - distance / longer length`, over chars.
fn edit_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein_distance(a, b);
    let max_len = a.chars().count().max(b.chars().count());

    1.0 - (distance as f64 / max_len as f64)
}

/// Levenshtein distance over chars, two rows at a time.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Jaccard overlap of the two word sets.
fn token_overlap(a: &str, b: &str) -> f64 {
    let a_words: HashSet<&str> = a.split_whitespace().collect();
    let b_words: HashSet<&str> = b.split_whitespace().collect();
    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }

    let shared = a_words.intersection(&b_words).count();
    let total = a_words.union(&b_words).count();
    shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::DuplicatePolicy;

    fn builtin() -> CommandTable {
        CommandTable::builtin().unwrap()
    }

    #[test]
    fn test_every_entry_matches_itself_exactly() {
        let table = builtin();
        let matcher = Matcher::default();
        for entry in table.entries() {
            let result = matcher.match_input(&table, &entry.input);
            assert!(result.matched(), "{} did not match", entry.input);
            assert_eq!(result.kind, MatchKind::Exact);
            assert_eq!(result.entry, Some(entry));
            assert_eq!(result.confidence, 1.0);
        }
    }

    #[test]
    fn test_hello() {
        let table = builtin();
        let result = Matcher::default().match_input(&table, "hello");
        assert_eq!(
            result.entry.unwrap().output,
            "Hello! How can I assist you today?"
        );
    }

    #[test]
    fn test_case_and_whitespace_variants_match_like_hello() {
        let table = builtin();
        let matcher = Matcher::default();
        let expected = matcher.match_input(&table, "hello");
        assert_eq!(matcher.match_input(&table, "HELLO"), expected);
        assert_eq!(matcher.match_input(&table, "  hello  "), expected);
        assert_eq!(matcher.match_input(&table, "\tHeLLo\n"), expected);
    }

    #[test]
    fn test_gibberish_does_not_match() {
        let table = builtin();
        let result = Matcher::default().match_input(&table, "asdkjfhaskjdf");
        assert!(!result.matched());
        assert_eq!(result.kind, MatchKind::None);
        assert!(result.confidence < Matcher::DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_empty_input_does_not_match() {
        let table = builtin();
        assert!(!Matcher::default().match_input(&table, "").matched());
        assert!(!Matcher::default().match_input(&table, "   ").matched());
    }

    #[test]
    fn test_empty_table_does_not_match() {
        let table = CommandTable::default();
        assert!(!Matcher::default().match_input(&table, "hello").matched());
    }

    #[test]
    fn test_fuzzy_typo() {
        let table = builtin();
        let result = Matcher::default().match_input(&table, "weather forcast");
        assert_eq!(result.kind, MatchKind::Fuzzy);
        assert_eq!(result.entry.unwrap().input, "weather forecast");
        assert!(result.confidence >= 0.9 && result.confidence < 1.0);
    }

    #[test]
    fn test_fuzzy_trailing_punctuation() {
        let table = builtin();
        let result = Matcher::default().match_input(&table, "What time is it?");
        assert_eq!(result.entry.unwrap().input, "what time is it");
    }

    #[test]
    fn test_fuzzy_reordered_words() {
        let table = builtin();
        let result = Matcher::default().match_input(&table, "lights turn on");
        assert_eq!(result.kind, MatchKind::Fuzzy);
        assert_eq!(result.entry.unwrap().input, "turn on lights");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_fuzzy_ties_go_to_first_inserted() {
        let table = CommandTable::load_sources(
            [br#"[{"input": "abcd", "output": "first"}, {"input": "abce", "output": "second"}]"#
                .as_slice()],
            DuplicatePolicy::Reject,
        )
        .unwrap();
        let result = Matcher::new(0.7).match_input(&table, "abcf");
        assert_eq!(result.entry.unwrap().output, "first");
    }

    #[test]
    fn test_threshold_is_respected() {
        let table = builtin();
        assert!(!Matcher::new(0.95).match_input(&table, "weather forcast").matched());
        assert!(Matcher::new(0.5).match_input(&table, "turn lights").matched());
    }

    #[test]
    fn test_suggest_ranks_closest_first() {
        let table = builtin();
        let matcher = Matcher::default();
        assert!(!matcher.match_input(&table, "turn lights").matched());

        let suggestions = matcher.suggest(&table, "turn lights", 3);
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0].entry.input, "turn on lights");
        assert_eq!(suggestions[1].entry.input, "turn off lights");
        assert!(suggestions[0].score >= suggestions[1].score);
        assert!(suggestions[1].score >= suggestions[2].score);
    }

    #[test]
    fn test_suggest_empty_input() {
        let table = builtin();
        assert!(Matcher::default().suggest(&table, "  ", 5).is_empty());
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("hello", "hello"), 1.0);
        assert_eq!(similarity("", "hello"), 0.0);
        assert!(similarity("hello", "help") < Matcher::DEFAULT_THRESHOLD);
        assert_eq!(token_overlap("dim lights", "lights dim"), 1.0);
        assert_eq!(token_overlap("play music", "pause music"), 1.0 / 3.0);
    }
}
