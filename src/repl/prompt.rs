//! Custom prompt implementation for the interactive shell

use std::borrow::Cow;

use nu_ansi_term::{Color, Style};
use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Prompt showing the root command's name
pub struct ShellPrompt {
    /// Name shown before the indicator
    name: String,
    /// Style applied to the name, if coloring is enabled
    style: Option<Style>,
}

impl ShellPrompt {
    /// Create a new prompt
    ///
    /// # Arguments
    /// * `name` - Text shown before `> `
    ///
    /// # Returns
    /// * `Self` - New prompt
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: None,
        }
    }

    /// Paint the name in bold green
    pub fn colored(mut self) -> Self {
        self.style = Some(Style::new().bold().fg(Color::Green));
        self
    }
}

impl Prompt for ShellPrompt {
    /// Render the left prompt (main prompt)
    ///
    /// # Returns
    /// * `Cow<str>` - Prompt string
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match self.style {
            Some(style) => format!("{}> ", style.paint(&self.name)).into(),
            None => format!("{}> ", self.name).into(),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        "".into()
    }

    /// Render the prompt indicator (empty since it is part of the left prompt)
    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        "... ".into()
    }

    /// Render the history search prompt
    ///
    /// # Arguments
    /// * `history_search` - History search state
    ///
    /// # Returns
    /// * `Cow<str>` - History search prompt
    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}
