//! Completer for reedline - provides completion suggestions

use reedline::{Completer, Span, Suggestion};

use super::completion::Document;
use super::shared_state::SharedSession;

/// Command-tree completer for reedline
pub struct ReplCompleter {
    /// Session whose tree and caches answer the suggestion pass
    session: SharedSession,
}

impl ReplCompleter {
    /// Create a new completer
    ///
    /// # Arguments
    /// * `session` - Shared session
    ///
    /// # Returns
    /// * `Self` - New completer
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

impl Completer for ReplCompleter {
    /// Complete the input at the given cursor position
    ///
    /// Every suggestion replaces the word before the cursor.
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - List of completion suggestions
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let doc = Document::new(line, pos);
        let span = Span::new(doc.word_start(), doc.cursor());

        let candidates = self.session.lock().suggest(line, doc.cursor());
        candidates
            .into_iter()
            .map(|candidate| Suggestion {
                value: candidate.text,
                description: (!candidate.description.is_empty()).then_some(candidate.description),
                span,
                append_whitespace: true,
                ..Default::default()
            })
            .collect()
    }
}
