//! Final filtering of aggregated suggestions
//!
//! The default [`PrefixFilter`] keeps suggestions whose text starts with the
//! word before the cursor. A host may install any [`SuggestionFilter`]
//! instead; it then replaces the prefix filter entirely.

use super::engine::Suggestion;
use super::token_stream::Document;

/// Final filter applied to the aggregated suggestion list
pub trait SuggestionFilter: Send + Sync {
    fn filter(&self, suggestions: Vec<Suggestion>, doc: &Document) -> Vec<Suggestion>;
}

impl<F> SuggestionFilter for F
where
    F: Fn(Vec<Suggestion>, &Document) -> Vec<Suggestion> + Send + Sync,
{
    fn filter(&self, suggestions: Vec<Suggestion>, doc: &Document) -> Vec<Suggestion> {
        self(suggestions, doc)
    }
}

/// Prefix match against the word before the cursor
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixFilter {
    /// Compare without regard to case
    pub ignore_case: bool,

    /// Move exact and shorter matches ahead of the rest
    pub sort_matches: bool,
}

impl PrefixFilter {
    /// Case-sensitive filter that preserves input order
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the suggestions whose text starts with `word`
    ///
    /// # Arguments
    /// * `suggestions` - Candidates in aggregation order
    /// * `word` - The word before the cursor
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - Matching candidates; input order is kept among
    ///   equally ranked matches
    pub fn apply(&self, suggestions: Vec<Suggestion>, word: &str) -> Vec<Suggestion> {
        if word.is_empty() {
            return suggestions;
        }

        let needle = self.fold(word);
        let mut matches: Vec<Suggestion> = suggestions
            .into_iter()
            .filter(|s| self.fold(&s.text).starts_with(needle.as_str()))
            .collect();

        if self.sort_matches {
            // Stable: ties keep aggregation order
            matches.sort_by_key(|s| (self.fold(&s.text) != needle, s.text.len()));
        }
        matches
    }

    fn fold(&self, text: &str) -> String {
        if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

impl SuggestionFilter for PrefixFilter {
    fn filter(&self, suggestions: Vec<Suggestion>, doc: &Document) -> Vec<Suggestion> {
        self.apply(suggestions, doc.word_before_cursor())
    }
}

/// Keep candidates whose text starts with `partial` (empty keeps all)
pub fn filter_has_prefix(suggestions: Vec<Suggestion>, partial: &str) -> Vec<Suggestion> {
    PrefixFilter::new().apply(suggestions, partial)
}
