//! Error handling module for cmdprompt.
//!
//! Declaration, parsing, execution and configuration failures each have their
//! own kind, wrapped by [`PromptError`]. Completion never fails: every
//! condition on the suggestion path degrades to fewer suggestions instead.
//!
//! # Example
//!
//! ```rust
//! use cmdprompt::error::{ParseError, PromptError, Result};
//!
//! fn require_value(value: Option<&str>) -> Result<&str> {
//!     value.ok_or_else(|| ParseError::MissingFlagValue("name".to_string()).into())
//! }
//!
//! assert!(matches!(require_value(None), Err(PromptError::Parse(_))));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ExecutionError, ParseError, PromptError, Result, TreeError};
