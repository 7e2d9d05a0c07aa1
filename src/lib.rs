//! cmdprompt Library
//!
//! Interactive prompt with context-aware completion for nested command trees.
//! A host declares commands and flags, and the library answers every
//! keystroke with suggestions for subcommands, flag names and flag values,
//! then runs submitted lines against the tree.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing for the demo shell
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `executor`: Argument parsing and command routing
//! - `repl`: Completion engine, sessions and the interactive front end
//! - `tree`: Command tree and flag store
//!
//! # Example
//!
//! ```
//! use cmdprompt::{CommandSpec, CommandTree, EngineOptions, FlagSpec, Session};
//!
//! let mut tree = CommandTree::new(CommandSpec::new("root"));
//! let get = tree.add_command(tree.root(), CommandSpec::new("get"))?;
//! let food = tree.add_command(get, CommandSpec::new("food").run(|_| Ok(())))?;
//! tree.add_flag(food, FlagSpec::string("name", "John"))?;
//!
//! let mut session = Session::new(tree, EngineOptions::default())?;
//! let suggestions = session.suggest("get food --n", 12);
//! assert_eq!(suggestions[0].text, "--name");
//! # Ok::<(), cmdprompt::PromptError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod repl;
pub mod tree;

// Re-export commonly used types
pub use config::Config;
pub use error::{PromptError, Result};
pub use executor::{ExecutionOutcome, Invocation};
pub use repl::{EngineOptions, ReplEngine, Session, SharedSession, Suggestion};
pub use tree::{CommandSpec, CommandTree, FlagSpec, NodeId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
