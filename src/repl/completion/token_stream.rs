//! Input document with cursor awareness, and the pluggable tokenizer
//!
//! The [`Document`] answers the questions the resolver asks about the line
//! being edited: what lies before the cursor, which word the cursor is on,
//! and whether that text ends in whitespace.

use std::fmt;

/// Snapshot of the line being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full input text
    text: String,
    /// Cursor position (byte index, always on a char boundary)
    cursor: usize,
}

impl Document {
    /// Create a document with the cursor at `cursor`
    ///
    /// # Arguments
    /// * `text` - The input text
    /// * `cursor` - Cursor position (byte index); clamped to the text and
    ///   moved back to the nearest char boundary
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let mut cursor = cursor.min(text.len());
        while !text.is_char_boundary(cursor) {
            cursor -= 1;
        }
        Self { text, cursor }
    }

    /// Create a document with the cursor at the end of `text`
    pub fn at_end(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Text strictly before the cursor
    pub fn text_before_cursor(&self) -> &str {
        &self.text[..self.cursor]
    }

    /// The line containing the cursor
    pub fn current_line(&self) -> &str {
        let start = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
        let end = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
        &self.text[start..end]
    }

    /// Characters between the last whitespace before the cursor and the cursor
    pub fn word_before_cursor(&self) -> &str {
        let before = self.text_before_cursor();
        let start = before
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8());
        &before[start..]
    }

    /// Byte index where the word before the cursor starts
    pub fn word_start(&self) -> usize {
        self.cursor - self.word_before_cursor().len()
    }

    /// Whether the text before the cursor ends in whitespace
    pub fn has_trailing_space(&self) -> bool {
        self.text_before_cursor()
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.text_before_cursor(), &self.text[self.cursor..])
    }
}

/// Splits a line into argument tokens.
///
/// Used both for the line submitted for execution and for the text before
/// the cursor during completion.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, line: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, line: &str) -> Vec<String> {
        self(line)
    }
}

/// Default tokenizer: splits on runs of whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }
}
