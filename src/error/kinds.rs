use std::{fmt, io};

/// Crate-wide `Result` type using [`PromptError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, PromptError>;

/// Top-level error type for cmdprompt operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum PromptError {
    /// Command tree declaration errors.
    Tree(TreeError),

    /// Argument parsing errors.
    Parse(ParseError),

    /// Command execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors raised while declaring the command tree.
#[derive(Debug)]
pub enum TreeError {
    /// A sibling already uses this name or alias.
    DuplicateCommand { parent: String, name: String },

    /// A flag with this name is already visible at the command.
    DuplicateFlag { command: String, name: String },

    /// A flag with this shorthand is already visible at the command.
    DuplicateShorthand { command: String, shorthand: char },

    /// Node id does not belong to this tree.
    UnknownNode(usize),

    /// Flag is not declared on the command.
    UnknownFlag { command: String, name: String },

    /// Declared default does not parse for the flag type.
    InvalidDefault {
        name: String,
        value: String,
        expected: &'static str,
    },
}

/// Errors raised while parsing a submitted line into flags and arguments.
#[derive(Debug)]
pub enum ParseError {
    /// Flag is not visible at the resolved command.
    UnknownFlag(String),

    /// Shorthand is not visible at the resolved command.
    UnknownShorthand(char),

    /// A non-boolean flag was given without a value.
    MissingFlagValue(String),

    /// Value does not parse for the flag type.
    InvalidFlagValue {
        flag: String,
        value: String,
        expected: &'static str,
    },

    /// Positional argument given to a command that only groups subcommands.
    UnknownCommand { command: String, arg: String },
}

/// Errors raised by command runners.
#[derive(Debug)]
pub enum ExecutionError {
    /// The runner of a command returned an error.
    CommandFailed { command: String, message: String },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::Tree(e) => write!(f, "Command tree error: {e}"),
            PromptError::Parse(e) => write!(f, "{e}"),
            PromptError::Execution(e) => write!(f, "{e}"),
            PromptError::Config(e) => write!(f, "Configuration error: {e}"),
            PromptError::Io(e) => write!(f, "I/O error: {e}"),
            PromptError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::DuplicateCommand { parent, name } => {
                write!(f, "command '{parent}' already has a subcommand named '{name}'")
            }
            TreeError::DuplicateFlag { command, name } => {
                write!(f, "flag '--{name}' is already defined for '{command}'")
            }
            TreeError::DuplicateShorthand { command, shorthand } => {
                write!(f, "shorthand '-{shorthand}' is already defined for '{command}'")
            }
            TreeError::UnknownNode(id) => write!(f, "no command with id {id}"),
            TreeError::UnknownFlag { command, name } => {
                write!(f, "flag '--{name}' is not defined for '{command}'")
            }
            TreeError::InvalidDefault {
                name,
                value,
                expected,
            } => write!(f, "default '{value}' for flag '--{name}' is not a valid {expected}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownFlag(name) => write!(f, "unknown flag: --{name}"),
            ParseError::UnknownShorthand(c) => {
                write!(f, "unknown shorthand flag: '{c}' in -{c}")
            }
            ParseError::MissingFlagValue(name) => {
                write!(f, "flag needs an argument: --{name}")
            }
            ParseError::InvalidFlagValue {
                flag,
                value,
                expected,
            } => write!(
                f,
                "invalid argument \"{value}\" for \"--{flag}\" flag: expected {expected}"
            ),
            ParseError::UnknownCommand { command, arg } => {
                write!(f, "unknown command \"{arg}\" for \"{command}\"")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::CommandFailed { command, message } => {
                write!(f, "{command}: {message}")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for TreeError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to PromptError ========================= */

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::Io(err)
    }
}

impl From<TreeError> for PromptError {
    fn from(err: TreeError) -> Self {
        PromptError::Tree(err)
    }
}

impl From<ParseError> for PromptError {
    fn from(err: ParseError) -> Self {
        PromptError::Parse(err)
    }
}

impl From<ExecutionError> for PromptError {
    fn from(err: ExecutionError) -> Self {
        PromptError::Execution(err)
    }
}

impl From<ConfigError> for PromptError {
    fn from(err: ConfigError) -> Self {
        PromptError::Config(err)
    }
}

impl From<toml::de::Error> for PromptError {
    fn from(err: toml::de::Error) -> Self {
        PromptError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for PromptError {
    fn from(err: toml::ser::Error) -> Self {
        PromptError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<String> for PromptError {
    fn from(msg: String) -> Self {
        PromptError::Generic(msg)
    }
}

impl From<&str> for PromptError {
    fn from(msg: &str) -> Self {
        PromptError::Generic(msg.to_owned())
    }
}

impl From<reedline::ReedlineError> for PromptError {
    fn from(err: reedline::ReedlineError) -> Self {
        PromptError::Generic(format!("Line editor error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_read_like_flag_parser_messages() {
        let err: PromptError = ParseError::MissingFlagValue("name".to_string()).into();
        assert_eq!(err.to_string(), "flag needs an argument: --name");

        let err: PromptError = ParseError::InvalidFlagValue {
            flag: "count".to_string(),
            value: "abc".to_string(),
            expected: "int",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid argument \"abc\" for \"--count\" flag: expected int"
        );
    }

    #[test]
    fn tree_errors_are_prefixed() {
        let err: PromptError = TreeError::DuplicateCommand {
            parent: "get".to_string(),
            name: "food".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Command tree error:"));
    }

    #[test]
    fn io_error_exposes_source() {
        use std::error::Error;

        let err: PromptError = io::Error::other("boom").into();
        assert!(err.source().is_some());
    }
}
