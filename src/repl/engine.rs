use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::error::Result;
use crate::executor::ExecutionOutcome;

use super::completer::ReplCompleter;
use super::prompt::ShellPrompt;
use super::shared_state::SharedSession;

const COMPLETION_MENU: &str = "completion_menu";

/// REPL engine for interactive command execution
pub struct ReplEngine {
    /// Line editor for command input
    editor: Reedline,

    /// Prompt rendered before each line
    prompt: ShellPrompt,

    /// Session shared with the completer
    session: SharedSession,

    /// Whether to continue running
    running: bool,
}

impl ReplEngine {
    /// Create a new REPL engine over a shared session
    ///
    /// # Arguments
    /// * `session` - Session answering completion and execution
    /// * `history_config` - History configuration
    /// * `color_enabled` - Paint the prompt
    ///
    /// # Returns
    /// * `Result<Self>` - New REPL engine or error
    pub fn new(session: SharedSession, history_config: &HistoryConfig, color_enabled: bool) -> Result<Self> {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let completer = Box::new(ReplCompleter::new(session.clone()));
        let menu = Box::new(ColumnarMenu::default().with_name(COMPLETION_MENU));

        let mut editor = Reedline::create()
            .with_completer(completer)
            .with_menu(ReedlineMenu::EngineCompleter(menu))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        if history_config.persist {
            match FileBackedHistory::with_file(history_config.max_size, history_config.file_path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!(
                    "History file {} unavailable: {}",
                    history_config.file_path.display(),
                    e
                ),
            }
        }

        let mut prompt = ShellPrompt::new(session.root_name());
        if color_enabled {
            prompt = prompt.colored();
        }

        Ok(Self {
            editor,
            prompt,
            session,
            running: true,
        })
    }

    /// Read lines and execute them until `exit`, Ctrl-D or Ctrl-C
    ///
    /// # Returns
    /// * `Result<()>` - Ok when the REPL exits normally, error if the terminal fails
    pub fn run(&mut self) -> Result<()> {
        while self.running {
            let line = match self.read_line()? {
                Some(line) if !line.trim().is_empty() => line,
                Some(_) => continue,
                None => break,
            };
            self.running = handle_line(&self.session, &line);
        }
        Ok(())
    }

    /// Read a single line of input
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line or None on Ctrl-D / Ctrl-C
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(line) => Ok(Some(line)),
            signal => {
                debug!("Input closed by {:?}", signal);
                Ok(None)
            }
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Execute one submitted line and print what the user should see
///
/// # Returns
/// * `bool` - False once the session asked to exit
pub(crate) fn handle_line(session: &SharedSession, line: &str) -> bool {
    match session.lock().execute(line) {
        Ok(ExecutionOutcome::Exit) => false,
        Ok(ExecutionOutcome::Usage { text, .. }) => {
            println!("{}", text);
            true
        }
        Ok(ExecutionOutcome::Ran(_)) => true,
        // already reported through the session's error handler
        Err(e) => {
            debug!("Execution of '{}' failed: {}", line, e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{ExecutionError, PromptError};
    use crate::repl::{EngineOptions, Session};
    use crate::tree::{CommandSpec, CommandTree};

    fn shared(errors: Arc<AtomicUsize>) -> SharedSession {
        let mut tree = CommandTree::new(CommandSpec::new("root"));
        tree.add_command(tree.root(), CommandSpec::new("ping").run(|_| Ok(())))
            .unwrap();
        tree.add_command(
            tree.root(),
            CommandSpec::new("error").run(|inv| {
                Err(ExecutionError::CommandFailed {
                    command: inv.path(),
                    message: "boom".to_string(),
                }
                .into())
            }),
        )
        .unwrap();

        let options = EngineOptions {
            add_exit_command: true,
            add_help: true,
            on_error: Some(Arc::new(move |_: &PromptError| {
                errors.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        SharedSession::new(Session::new(tree, options).unwrap())
    }

    #[test]
    fn test_exit_stops_loop() {
        let session = shared(Arc::new(AtomicUsize::new(0)));
        assert!(handle_line(&session, "ping"));
        assert!(handle_line(&session, "help ping"));
        assert!(!handle_line(&session, "exit"));
    }

    #[test]
    fn test_failures_keep_running() {
        let errors = Arc::new(AtomicUsize::new(0));
        let session = shared(errors.clone());
        assert!(handle_line(&session, "error"));
        assert!(handle_line(&session, "ping --bogus"));
        assert_eq!(errors.load(Ordering::SeqCst), 2);
    }
}
