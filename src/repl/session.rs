//! Interactive session: one command tree, its options and its caches
//!
//! A [`Session`] is the engine instance the front end drives. It answers
//! the per-keystroke suggestion pass and runs submitted lines, applying the
//! configured flag policy around both. Sessions share no state with each
//! other; a host wanting concurrent sessions builds one per tree.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{EngineConfig, FlagPolicy};
use crate::error::{PromptError, Result};
use crate::executor::{Builtins, CommandRouter, ExecutionOutcome};
use crate::tree::{CommandSpec, CommandTree, FlagSpec};

use super::completion::{
    CompletionEngine, DEFAULT_CACHE_INTERVAL, Document, DynamicSuggestions, PrefixFilter,
    Suggestion, SuggestionFilter, Tokenizer, Visibility, WhitespaceTokenizer,
};
use super::reconciler::Reconciler;

/// Called with the error of a failed execution
pub type ErrorHandler = Arc<dyn Fn(&PromptError) + Send + Sync>;

/// Called with the submitted line before or after execution
pub type InputHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Session configuration
///
/// Every field has a built-in default; see [`EngineOptions::default`].
#[derive(Clone)]
pub struct EngineOptions {
    /// Splits submitted lines and completion input into tokens
    pub tokenizer: Arc<dyn Tokenizer>,

    /// Replaces the default prefix filter when set
    pub filter: Option<Arc<dyn SuggestionFilter>>,

    /// Provider for commands tagged with a dynamic-suggestion key
    pub dynamic_suggestions: Option<Arc<dyn DynamicSuggestions>>,

    /// Execution error handler; when unset the error is printed and the
    /// process exits with status 1
    pub on_error: Option<ErrorHandler>,

    /// Runs before every submitted line
    pub hook_before: Option<InputHook>,

    /// Runs after every submitted line, whether or not it failed
    pub hook_after: Option<InputHook>,

    /// How long flag-value suggestions are reused
    pub cache_interval: Duration,

    pub show_hidden_commands: bool,
    pub show_hidden_flags: bool,

    /// What happens to flag values after a command runs
    pub flag_policy: FlagPolicy,

    /// Append dynamic suggestions after filtering instead of filtering them
    pub trust_dynamic_suggestions: bool,

    /// Move exact and shorter matches to the front in the default filter
    pub sort_suggestions: bool,

    /// Register an `exit` command on the root
    pub add_exit_command: bool,

    /// Register a `help` command and a persistent `--help/-h` flag
    pub add_help: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tokenizer: Arc::new(WhitespaceTokenizer),
            filter: None,
            dynamic_suggestions: None,
            on_error: None,
            hook_before: None,
            hook_after: None,
            cache_interval: DEFAULT_CACHE_INTERVAL,
            show_hidden_commands: false,
            show_hidden_flags: false,
            flag_policy: FlagPolicy::ResetAfterRun,
            trust_dynamic_suggestions: false,
            sort_suggestions: false,
            add_exit_command: false,
            add_help: false,
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("custom_filter", &self.filter.is_some())
            .field("dynamic_suggestions", &self.dynamic_suggestions.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("cache_interval", &self.cache_interval)
            .field("show_hidden_commands", &self.show_hidden_commands)
            .field("show_hidden_flags", &self.show_hidden_flags)
            .field("flag_policy", &self.flag_policy)
            .field("trust_dynamic_suggestions", &self.trust_dynamic_suggestions)
            .field("add_exit_command", &self.add_exit_command)
            .field("add_help", &self.add_help)
            .finish_non_exhaustive()
    }
}

impl EngineOptions {
    /// Options taken from the `[engine]` configuration section
    ///
    /// Callbacks are left unset; the host fills them in.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            cache_interval: Duration::from_millis(config.cache_interval_ms),
            show_hidden_commands: config.show_hidden_commands,
            show_hidden_flags: config.show_hidden_flags,
            flag_policy: config.flag_policy,
            trust_dynamic_suggestions: config.trust_dynamic_suggestions,
            sort_suggestions: config.sort_suggestions,
            add_exit_command: config.add_exit_command,
            add_help: config.add_help,
            ..Self::default()
        }
    }
}

/// An interactive session over one command tree
pub struct Session {
    /// Command tree with its flag values
    tree: CommandTree,

    /// Configuration the session was built with
    options: EngineOptions,

    /// Completion pipeline, including the value cache
    completion: CompletionEngine,

    /// Flag policy
    reconciler: Reconciler,

    /// Commands and flags handled by the router itself
    builtins: Builtins,
}

impl Session {
    /// Create a session
    ///
    /// Registers the built-in commands and reserved flags the options ask
    /// for on `tree`.
    ///
    /// # Arguments
    /// * `tree` - Declared command tree
    /// * `options` - Session configuration
    ///
    /// # Returns
    /// * `Result<Self>` - The session, or a tree error if a built-in name is taken
    pub fn new(mut tree: CommandTree, options: EngineOptions) -> Result<Self> {
        let root = tree.root();
        let mut builtins = Builtins::default();

        if options.add_help {
            builtins.help = Some(tree.add_command(
                root,
                CommandSpec::new("help").short("Help about any command"),
            )?);
            builtins.help_flag = Some(tree.add_flag(
                root,
                FlagSpec::bool("help", false)
                    .shorthand('h')
                    .usage("help for this command")
                    .persistent(),
            )?);
        }
        if options.add_exit_command {
            builtins.exit = Some(tree.add_command(root, CommandSpec::new("exit").short("Exit prompt"))?);
        }

        let mut reconciler = Reconciler::new(options.flag_policy);
        reconciler.install(&mut tree)?;

        let filter: Arc<dyn SuggestionFilter> = match &options.filter {
            Some(filter) => filter.clone(),
            None => Arc::new(PrefixFilter {
                ignore_case: false,
                sort_matches: options.sort_suggestions,
            }),
        };
        let mut completion = CompletionEngine::new()
            .with_tokenizer(options.tokenizer.clone())
            .with_filter(filter)
            .with_visibility(Visibility {
                show_hidden_commands: options.show_hidden_commands,
                show_hidden_flags: options.show_hidden_flags,
            })
            .with_cache_interval(options.cache_interval)
            .trust_dynamic_suggestions(options.trust_dynamic_suggestions);
        if let Some(provider) = &options.dynamic_suggestions {
            completion = completion.with_dynamic_suggestions(provider.clone());
        }

        debug!("Session created with {:?}", options);
        Ok(Self {
            tree,
            options,
            completion,
            reconciler,
            builtins,
        })
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Suggestions for `line` with the cursor at byte `cursor`
    pub fn suggest(&mut self, line: &str, cursor: usize) -> Vec<Suggestion> {
        self.suggest_at(line, cursor, Instant::now())
    }

    /// Suggestions for `line` as of `now`
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `cursor` - Cursor position (byte index)
    /// * `now` - Time used for the flag-value cache
    pub fn suggest_at(&mut self, line: &str, cursor: usize, now: Instant) -> Vec<Suggestion> {
        let doc = Document::new(line, cursor);
        let context = self.completion.resolve(&self.tree, &doc);
        self.reconciler.before_suggest(&mut self.tree, context.node);
        self.completion.complete_resolved(&self.tree, &doc, context, now)
    }

    /// Execute a submitted line
    ///
    /// Order: before hook, tokenize, revert unpersisted flags, route, error
    /// handler on failure, flag reconciliation for the resolved command,
    /// after hook.
    ///
    /// # Arguments
    /// * `line` - The submitted line
    ///
    /// # Returns
    /// * `Result<ExecutionOutcome>` - What happened; errors have already
    ///   been passed to the error handler
    pub fn execute(&mut self, line: &str) -> Result<ExecutionOutcome> {
        if let Some(hook) = &self.options.hook_before {
            hook(line);
        }

        let args = self.completion.tokenizer().tokenize(line);
        let (executed, _) = self.tree.find(&args);
        self.reconciler.before_run(&mut self.tree, executed);

        let result = CommandRouter::new(&mut self.tree, &self.builtins).route(&args);
        if let Err(err) = &result {
            self.handle_error(err);
        }

        self.reconciler.after_run(&mut self.tree, executed);

        if let Some(hook) = &self.options.hook_after {
            hook(line);
        }
        result
    }

    fn handle_error(&self, err: &PromptError) {
        match &self.options.on_error {
            Some(handler) => handler(err),
            None => {
                warn!("Command failed without an error handler: {}", err);
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        }
    }
}
