//! Interactive shell over a command tree
//!
//! This module provides:
//! - The completion engine that answers each keystroke ([`completion`])
//! - The [`Session`] that owns a tree, its options and caches
//! - Flag-state reconciliation between runs
//! - A reedline front end with a Tab-triggered completion menu and history

pub mod completer;
pub mod completion;
pub mod engine;
pub mod prompt;
pub mod reconciler;
pub mod session;
pub mod shared_state;

pub use completer::ReplCompleter;
pub use completion::{CompletionEngine, Document, DynamicSuggestions, Suggestion, SuggestionFilter, Tokenizer};
pub use engine::ReplEngine;
pub use prompt::ShellPrompt;
pub use reconciler::{PERSIST_FLAG, Reconciler};
pub use session::{EngineOptions, ErrorHandler, InputHook, Session};
pub use shared_state::SharedSession;
