//! Completion context resolution
//!
//! Given the document being edited, the resolver finds the command the line
//! addresses and classifies what kind of token the cursor is on. Whether the
//! cursor sits inside a flag's value depends on the trailing-whitespace parity
//! of the text before the cursor, so the classification looks at the last two
//! words and at whether a space follows them.

use tracing::trace;

use crate::tree::{CommandTree, FlagKey, NodeId, VisibleFlag};

use super::token_stream::{Document, Tokenizer};

/// Kind of token the cursor is on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorPosition {
    /// A subcommand name of the current command
    CommandName,

    /// A flag name (the word before the cursor starts with `-`)
    FlagName,

    /// The value of a flag
    FlagValue(FlagValueContext),

    /// A positional argument of a command with no subcommands
    FreeArgument,
}

impl CursorPosition {
    pub fn is_value_context(&self) -> bool {
        matches!(self, CursorPosition::FlagValue(_))
    }
}

/// The flag whose value is being completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValueContext {
    /// The flag, if the dash-prefixed token resolved to one
    pub flag: Option<FlagKey>,
    /// Whether the resolved flag is a boolean
    pub is_bool: bool,
    /// Value typed so far (empty right after the flag token)
    pub partial: String,
}

/// Result of resolving a document against a command tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    /// Deepest command matched by the current line
    pub node: NodeId,
    /// Classification of the cursor position
    pub position: CursorPosition,
    /// Tokens of the current line, handed to value-completion callbacks
    pub line_tokens: Vec<String>,
}

/// Resolves a document to a command and cursor position
pub struct ContextResolver<'a> {
    tree: &'a CommandTree,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> ContextResolver<'a> {
    /// Create a resolver
    ///
    /// # Arguments
    /// * `tree` - Command tree to resolve against
    /// * `tokenizer` - Splits lines into argument tokens
    pub fn new(tree: &'a CommandTree, tokenizer: &'a dyn Tokenizer) -> Self {
        Self { tree, tokenizer }
    }

    /// Resolve the document
    ///
    /// # Arguments
    /// * `doc` - The line being edited
    ///
    /// # Returns
    /// * `ResolvedContext` - Current command and cursor classification
    pub fn resolve(&self, doc: &Document) -> ResolvedContext {
        let line_tokens = self.tokenizer.tokenize(doc.current_line());
        let (node, _) = self.tree.find(&line_tokens);

        let prev_words = self.tokenizer.tokenize(doc.text_before_cursor());
        let position = self.classify(node, doc, &prev_words);
        trace!(
            "Resolved '{}' to '{}' at {:?}",
            doc,
            self.tree.command_path(node),
            position
        );

        ResolvedContext {
            node,
            position,
            line_tokens,
        }
    }

    /// Classify the cursor position at `node`
    ///
    /// # Arguments
    /// * `node` - The current command
    /// * `doc` - The line being edited
    /// * `prev_words` - Tokens of the text before the cursor
    pub fn classify(&self, node: NodeId, doc: &Document, prev_words: &[String]) -> CursorPosition {
        let trailing_space = doc.has_trailing_space();
        let last_word = prev_words.last().map(String::as_str).unwrap_or("");
        let second_last_word = match prev_words.len() {
            n if n > 1 => prev_words[n - 2].as_str(),
            _ => "",
        };

        // Typing a value: `--name Jo`
        if !trailing_space
            && second_last_word.starts_with('-')
            && let Some(flag) = flag_from_arg(self.tree, node, second_last_word)
            && !flag.spec.is_bool()
        {
            return CursorPosition::FlagValue(FlagValueContext {
                flag: Some(flag.key()),
                is_bool: false,
                partial: last_word.to_string(),
            });
        }

        // Just finished a flag: `--name `
        if trailing_space && last_word.starts_with('-') && !last_word.contains('=') {
            let flag = flag_from_arg(self.tree, node, last_word);
            return CursorPosition::FlagValue(FlagValueContext {
                flag: flag.map(|f| f.key()),
                is_bool: flag.is_some_and(|f| f.spec.is_bool()),
                partial: String::new(),
            });
        }

        // Mid-word on a bare token, or a value was completed and a new token
        // is starting: neither is a value context.
        if doc.word_before_cursor().starts_with('-') {
            CursorPosition::FlagName
        } else if self.tree.children(node).is_empty() {
            CursorPosition::FreeArgument
        } else {
            CursorPosition::CommandName
        }
    }
}

/// Resolve a dash-prefixed token to a flag visible at `node`.
///
/// Leading dashes are stripped; a single remaining character is looked up
/// as a shorthand, anything longer by full name.
pub fn flag_from_arg<'t>(tree: &'t CommandTree, node: NodeId, arg: &str) -> Option<VisibleFlag<'t>> {
    let trimmed = arg.trim_start_matches('-');
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (None, _) => None,
        (Some(c), None) => tree.lookup_shorthand(node, c),
        _ => tree.lookup_flag(node, trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::completion::token_stream::WhitespaceTokenizer;
    use crate::tree::{CommandSpec, FlagSpec};

    struct Sample {
        tree: CommandTree,
        get: NodeId,
        object: NodeId,
        food: NodeId,
    }

    fn sample() -> Sample {
        let mut tree = CommandTree::new(CommandSpec::new("root"));
        let get = tree
            .add_command(tree.root(), CommandSpec::new("get").alias("eat"))
            .unwrap();
        let object = tree.add_command(get, CommandSpec::new("object")).unwrap();
        let food = tree.add_command(get, CommandSpec::new("food")).unwrap();
        tree.add_flag(object, FlagSpec::bool("verbose", false).shorthand('v'))
            .unwrap();
        tree.add_flag(food, FlagSpec::string("name", "John").shorthand('n'))
            .unwrap();
        Sample {
            tree,
            get,
            object,
            food,
        }
    }

    fn resolve(sample: &Sample, line: &str) -> ResolvedContext {
        ContextResolver::new(&sample.tree, &WhitespaceTokenizer).resolve(&Document::at_end(line))
    }

    fn name_key(sample: &Sample) -> Option<FlagKey> {
        Some(FlagKey::new(sample.food, "name"))
    }

    #[test]
    fn test_command_positions() {
        let s = sample();

        let ctx = resolve(&s, "");
        assert_eq!(ctx.node, s.tree.root());
        assert_eq!(ctx.position, CursorPosition::CommandName);

        let ctx = resolve(&s, "get ");
        assert_eq!(ctx.node, s.get);
        assert_eq!(ctx.position, CursorPosition::CommandName);

        let ctx = resolve(&s, "eat fo");
        assert_eq!(ctx.node, s.get);
        assert_eq!(ctx.position, CursorPosition::CommandName);
    }

    #[test]
    fn test_flag_name_and_free_argument() {
        let s = sample();

        let ctx = resolve(&s, "get object -");
        assert_eq!(ctx.node, s.object);
        assert_eq!(ctx.position, CursorPosition::FlagName);

        let ctx = resolve(&s, "get object --verb");
        assert_eq!(ctx.position, CursorPosition::FlagName);

        let ctx = resolve(&s, "get food apple");
        assert_eq!(ctx.position, CursorPosition::FreeArgument);
    }

    #[test]
    fn test_value_after_flag() {
        let s = sample();

        for line in ["get food --name ", "get food -n "] {
            let ctx = resolve(&s, line);
            assert_eq!(
                ctx.position,
                CursorPosition::FlagValue(FlagValueContext {
                    flag: name_key(&s),
                    is_bool: false,
                    partial: String::new(),
                }),
                "line {line:?}"
            );
        }
    }

    #[test]
    fn test_partial_value() {
        let s = sample();
        for line in ["get food --name J", "get food -n J"] {
            let ctx = resolve(&s, line);
            assert_eq!(
                ctx.position,
                CursorPosition::FlagValue(FlagValueContext {
                    flag: name_key(&s),
                    is_bool: false,
                    partial: "J".to_string(),
                }),
                "line {line:?}"
            );
            assert_eq!(ctx.line_tokens.len(), 4);
        }
    }

    #[test]
    fn test_completed_value_is_not_value_context() {
        let s = sample();
        assert_eq!(
            resolve(&s, "get food --name John ").position,
            CursorPosition::FreeArgument
        );
        assert_eq!(
            resolve(&s, "get food --name=John ").position,
            CursorPosition::FreeArgument
        );
    }

    #[test]
    fn test_bool_flag_opens_empty_value_context() {
        let s = sample();

        let ctx = resolve(&s, "get object -v ");
        match ctx.position {
            CursorPosition::FlagValue(value) => assert!(value.is_bool),
            other => panic!("unexpected position {other:?}"),
        }

        // a bool flag never takes the following word as its value
        let ctx = resolve(&s, "get object -v x");
        assert!(!ctx.position.is_value_context());
    }

    #[test]
    fn test_unknown_flag_yields_empty_identity() {
        let s = sample();
        let ctx = resolve(&s, "get food --nope ");
        assert_eq!(
            ctx.position,
            CursorPosition::FlagValue(FlagValueContext {
                flag: None,
                is_bool: false,
                partial: String::new(),
            })
        );
    }

    #[test]
    fn test_flag_from_arg() {
        let s = sample();
        assert_eq!(flag_from_arg(&s.tree, s.food, "-n").unwrap().spec.name(), "name");
        assert_eq!(flag_from_arg(&s.tree, s.food, "--name").unwrap().spec.name(), "name");
        assert!(flag_from_arg(&s.tree, s.food, "--").is_none());
        assert!(flag_from_arg(&s.tree, s.food, "-x").is_none());
    }
}
