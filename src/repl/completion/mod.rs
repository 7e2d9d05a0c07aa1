//! Completion system for the interactive shell
//!
//! On every keystroke the line being edited is resolved against the command
//! tree and turned into a ranked list of suggestions.
//!
//! # Architecture
//!
//! The completion system consists of several components:
//!
//! - **Document / Tokenizer**: the edited line with its cursor, and the
//!   pluggable splitting of lines into tokens
//! - **Context**: finds the current command and classifies the cursor as a
//!   command name, flag name, flag value or free argument
//! - **Provider**: gathers flag, subcommand, dynamic and flag-value candidates
//! - **Cache**: keeps flag-value candidates for a short interval
//! - **Filter**: the final prefix filter, replaceable by the host
//! - **Engine**: orchestrates the entire completion flow
//!
//! # Examples
//!
//! ```
//! use cmdprompt::repl::completion::{CompletionEngine, Document};
//! use cmdprompt::tree::{CommandSpec, CommandTree};
//!
//! let mut tree = CommandTree::new(CommandSpec::new("app"));
//! let get = tree.add_command(tree.root(), CommandSpec::new("get"))?;
//! tree.add_command(get, CommandSpec::new("object"))?;
//! tree.add_command(get, CommandSpec::new("food"))?;
//!
//! let mut engine = CompletionEngine::new();
//! let suggestions = engine.complete(&tree, &Document::at_end("get fo"));
//! assert_eq!(suggestions[0].text, "food");
//! # Ok::<(), cmdprompt::PromptError>(())
//! ```

mod cache;
mod context;
mod engine;
mod filter;
mod provider;
mod token_stream;

pub use cache::{CACHE_INTERVAL_FLAG, DEFAULT_CACHE_INTERVAL, SuggestionCache};
pub use context::{ContextResolver, CursorPosition, FlagValueContext, ResolvedContext, flag_from_arg};
pub use engine::{CompletionEngine, Suggestion};
pub use filter::{PrefixFilter, SuggestionFilter, filter_has_prefix};
pub use provider::{DynamicSuggestions, SuggestionAggregator, Visibility};
pub use token_stream::{Document, Tokenizer, WhitespaceTokenizer};
