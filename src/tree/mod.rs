//! Command tree declaration and read-only traversal
//!
//! A [`CommandTree`] owns its command nodes in an arena addressed by
//! [`NodeId`]. Nodes are declared once, before a session starts; afterwards
//! the completion engine only reads the structure and, through the flat
//! [`FlagStore`], reads and resets flag values.
//!
//! # Examples
//!
//! ```
//! use cmdprompt::tree::{CommandSpec, CommandTree, FlagSpec};
//!
//! let mut tree = CommandTree::new(CommandSpec::new("app"));
//! let get = tree.add_command(tree.root(), CommandSpec::new("get").short("Get something"))?;
//! let food = tree.add_command(get, CommandSpec::new("food").short("Get some food"))?;
//! tree.add_flag(food, FlagSpec::string("name", "John").shorthand('n'))?;
//!
//! let (node, rest) = tree.find(&["get".into(), "food".into(), "apple".into()]);
//! assert_eq!(node, food);
//! assert_eq!(rest, vec!["apple".to_string()]);
//! # Ok::<(), cmdprompt::PromptError>(())
//! ```

pub mod flags;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

pub use flags::{
    CompletionFn, FlagKey, FlagSnapshot, FlagSpec, FlagState, FlagStore, FlagType, parse_bool,
    parse_duration,
};

use crate::error::{ParseError, Result, TreeError};
use crate::executor::Invocation;

/// Callback run when a command is executed.
pub type Runner = Arc<dyn Fn(&Invocation<'_>) -> Result<()> + Send + Sync>;

/// Index of a command node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Capability tag: the command offers dynamic suggestions keyed by this value.
///
/// The value is opaque to the engine and only interpreted by the registered
/// dynamic-suggestion provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynamicSuggestionKey(String);

impl DynamicSuggestionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DynamicSuggestionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Builder for a command node.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    short: String,
    hidden: bool,
    dynamic_suggestions: Option<DynamicSuggestionKey>,
    runner: Option<Runner>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            short: String::new(),
            hidden: false,
            dynamic_suggestions: None,
            runner: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// One-line description, shown next to the command in suggestions.
    pub fn short(mut self, short: impl Into<String>) -> Self {
        self.short = short.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn dynamic_suggestions(mut self, key: impl Into<DynamicSuggestionKey>) -> Self {
        self.dynamic_suggestions = Some(key.into());
        self
    }

    pub fn run<F>(mut self, runner: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.runner = Some(Arc::new(runner));
        self
    }
}

/// A declared command.
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    short: String,
    hidden: bool,
    dynamic_suggestions: Option<DynamicSuggestionKey>,
    runner: Option<Runner>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    flags: Vec<FlagSpec>,
}

impl CommandNode {
    fn from_spec(spec: CommandSpec, parent: Option<NodeId>) -> Self {
        Self {
            name: spec.name,
            aliases: spec.aliases,
            short: spec.short,
            hidden: spec.hidden,
            dynamic_suggestions: spec.dynamic_suggestions,
            runner: spec.runner,
            parent,
            children: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn dynamic_suggestions(&self) -> Option<&DynamicSuggestionKey> {
        self.dynamic_suggestions.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_runnable(&self) -> bool {
        self.runner.is_some()
    }

    pub(crate) fn runner(&self) -> Option<&Runner> {
        self.runner.as_ref()
    }

    /// Whether `token` is this command's name or one of its aliases.
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }
}

/// A flag as seen from a particular command: its declaration plus the
/// command that owns it.
#[derive(Debug, Clone, Copy)]
pub struct VisibleFlag<'a> {
    pub owner: NodeId,
    pub spec: &'a FlagSpec,
}

impl VisibleFlag<'_> {
    pub fn key(&self) -> FlagKey {
        FlagKey::new(self.owner, self.spec.name())
    }
}

/// Arena of command nodes plus the state of every declared flag.
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    flags: FlagStore,
    completions: HashMap<FlagKey, CompletionFn>,
}

impl CommandTree {
    /// Create a tree with the given root command.
    pub fn new(root: CommandSpec) -> Self {
        Self {
            nodes: vec![CommandNode::from_spec(root, None)],
            flags: FlagStore::new(),
            completions: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different tree.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declare a subcommand of `parent`.
    pub fn add_command(&mut self, parent: NodeId, spec: CommandSpec) -> Result<NodeId> {
        let parent_node = self.checked(parent)?;
        let clash = std::iter::once(&spec.name)
            .chain(spec.aliases.iter())
            .find(|token| {
                parent_node
                    .children
                    .iter()
                    .any(|child| self.nodes[child.0].matches(token))
            });
        if let Some(token) = clash {
            return Err(TreeError::DuplicateCommand {
                parent: self.command_path(parent),
                name: token.clone(),
            }
            .into());
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::from_spec(spec, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Declare a flag on `node`.
    ///
    /// The name and shorthand must be unused among the flags visible at
    /// `node`, and for persistent flags also among every descendant's own flags.
    pub fn add_flag(&mut self, node: NodeId, spec: FlagSpec) -> Result<FlagKey> {
        self.checked(node)?;
        if !spec.value_type().accepts(spec.default_value()) {
            return Err(TreeError::InvalidDefault {
                name: spec.name().to_string(),
                value: spec.default_value().to_string(),
                expected: spec.value_type().name(),
            }
            .into());
        }

        let mut scope = vec![node];
        if spec.is_persistent() {
            scope.extend(self.subtree(node).into_iter().skip(1));
        }
        for (position, id) in scope.iter().enumerate() {
            // The declaring node is checked against everything it can see;
            // descendants only against their own declarations.
            let existing: Vec<&FlagSpec> = if position == 0 {
                self.visible_flags(*id).into_iter().map(|f| f.spec).collect()
            } else {
                self.nodes[id.0].flags.iter().collect()
            };
            if existing.iter().any(|f| f.name() == spec.name()) {
                return Err(TreeError::DuplicateFlag {
                    command: self.command_path(*id),
                    name: spec.name().to_string(),
                }
                .into());
            }
            if let Some(c) = spec.shorthand_char()
                && existing.iter().any(|f| f.shorthand_char() == Some(c))
            {
                return Err(TreeError::DuplicateShorthand {
                    command: self.command_path(*id),
                    shorthand: c,
                }
                .into());
            }
        }

        let key = FlagKey::new(node, spec.name());
        self.flags.insert(key.clone(), &spec);
        self.nodes[node.0].flags.push(spec);
        Ok(key)
    }

    /// Register a value-completion callback for a flag visible at `node`.
    ///
    /// The callback is attached to the declaring command, so it is found from
    /// every command that inherits the flag.
    pub fn register_flag_completion<F>(&mut self, node: NodeId, flag: &str, completion: F) -> Result<()>
    where
        F: Fn(&[String], &str) -> Vec<String> + Send + Sync + 'static,
    {
        self.checked(node)?;
        let key = self
            .lookup_flag(node, flag)
            .map(|f| f.key())
            .ok_or_else(|| TreeError::UnknownFlag {
                command: self.command_path(node),
                name: flag.to_string(),
            })?;
        self.completions.insert(key, Arc::new(completion));
        Ok(())
    }

    /// Value-completion callback for a flag, looked up by name from `node`.
    pub fn flag_completion(&self, node: NodeId, flag: &str) -> Option<&CompletionFn> {
        let key = self.lookup_flag(node, flag)?.key();
        self.completions.get(&key)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Direct child whose name or alias equals `token`.
    pub fn child_named(&self, node: NodeId, token: &str) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|child| self.node(*child).matches(token))
    }

    /// Ancestors of `node`, nearest first, not including `node`.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(node).parent, |id| self.node(*id).parent)
    }

    /// `node` and all of its descendants in pre-order.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Flags declared on `node` itself, in declaration order.
    pub fn local_flags(&self, node: NodeId) -> impl Iterator<Item = VisibleFlag<'_>> + '_ {
        self.node(node)
            .flags
            .iter()
            .map(move |spec| VisibleFlag { owner: node, spec })
    }

    /// Persistent flags of the ancestors of `node`, nearest ancestor first.
    pub fn inherited_flags(&self, node: NodeId) -> impl Iterator<Item = VisibleFlag<'_>> + '_ {
        self.ancestors(node).flat_map(move |owner| {
            self.node(owner)
                .flags
                .iter()
                .filter(|spec| spec.is_persistent())
                .map(move |spec| VisibleFlag { owner, spec })
        })
    }

    /// Local then inherited flags, each name reported once.
    pub fn visible_flags(&self, node: NodeId) -> Vec<VisibleFlag<'_>> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        for flag in self.local_flags(node).chain(self.inherited_flags(node)) {
            if seen.contains(&flag.spec.name()) {
                continue;
            }
            seen.push(flag.spec.name());
            out.push(flag);
        }
        out
    }

    pub fn lookup_flag(&self, node: NodeId, name: &str) -> Option<VisibleFlag<'_>> {
        self.local_flags(node)
            .chain(self.inherited_flags(node))
            .find(|flag| flag.spec.name() == name)
    }

    pub fn lookup_shorthand(&self, node: NodeId, shorthand: char) -> Option<VisibleFlag<'_>> {
        self.local_flags(node)
            .chain(self.inherited_flags(node))
            .find(|flag| flag.spec.shorthand_char() == Some(shorthand))
    }

    /// Current state of a flag visible at `node`.
    pub fn flag_state(&self, node: NodeId, name: &str) -> Option<&FlagState> {
        let key = self.lookup_flag(node, name)?.key();
        self.flags.get(&key)
    }

    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FlagStore {
        &mut self.flags
    }

    /// Space separated names from the root to `node`.
    pub fn command_path(&self, node: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(node)
            .map(|id| self.node(id).name())
            .collect();
        names.reverse();
        names.push(self.node(node).name());
        names.join(" ")
    }

    /// Walk `args` down the tree as far as names and aliases match.
    ///
    /// Flag tokens are skipped while walking; a non-boolean flag written
    /// without `=` also skips the value that follows it. The walk stops at the
    /// first bare token that matches no child. Everything not consumed as a
    /// command name is returned, in order, for argument parsing.
    pub fn find(&self, args: &[String]) -> (NodeId, Vec<String>) {
        let mut current = self.root();
        let mut rest = Vec::new();
        let mut descending = true;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if arg == "--" {
                rest.push(arg.clone());
                rest.extend(iter.by_ref().cloned());
                break;
            }
            if descending && arg.len() > 1 && arg.starts_with('-') {
                rest.push(arg.clone());
                if self.flag_takes_next_value(current, arg)
                    && let Some(value) = iter.next()
                {
                    rest.push(value.clone());
                }
                continue;
            }
            if descending {
                if let Some(child) = self.child_named(current, arg) {
                    current = child;
                    continue;
                }
                descending = false;
            }
            rest.push(arg.clone());
        }

        (current, rest)
    }

    fn flag_takes_next_value(&self, node: NodeId, arg: &str) -> bool {
        if arg.contains('=') {
            return false;
        }
        let flag = match arg.strip_prefix("--") {
            Some(name) => self.lookup_flag(node, name),
            None => {
                let mut chars = arg[1..].chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => self.lookup_shorthand(node, c),
                    _ => None,
                }
            }
        };
        flag.is_some_and(|f| !f.spec.is_bool())
    }

    /// Help text for a command.
    pub fn usage(&self, node: NodeId) -> String {
        let command = self.node(node);
        let path = self.command_path(node);
        let mut out = String::new();

        if !command.short.is_empty() {
            let _ = writeln!(out, "{}\n", command.short);
        }
        let _ = writeln!(out, "Usage:");
        if command.is_runnable() {
            let _ = writeln!(out, "  {path} [flags]");
        }
        if !command.children.is_empty() {
            let _ = writeln!(out, "  {path} [command]");
        }

        if !command.aliases.is_empty() {
            let _ = writeln!(out, "\nAliases:\n  {}, {}", command.name, command.aliases.join(", "));
        }

        let children: Vec<&CommandNode> = command
            .children
            .iter()
            .map(|id| self.node(*id))
            .filter(|child| !child.hidden)
            .collect();
        if !children.is_empty() {
            let width = children.iter().map(|c| c.name.len()).max().unwrap_or(0);
            let _ = writeln!(out, "\nAvailable Commands:");
            for child in children {
                let _ = writeln!(out, "  {:width$}  {}", child.name, child.short);
            }
        }

        let local: Vec<&FlagSpec> = self
            .local_flags(node)
            .map(|f| f.spec)
            .filter(|spec| !spec.is_hidden())
            .collect();
        let inherited: Vec<&FlagSpec> = self
            .visible_flags(node)
            .into_iter()
            .filter(|f| f.owner != node)
            .map(|f| f.spec)
            .filter(|spec| !spec.is_hidden())
            .collect();
        write_flag_section(&mut out, "Flags", &local);
        write_flag_section(&mut out, "Global Flags", &inherited);

        out.trim_end().to_string()
    }

    fn checked(&self, id: NodeId) -> Result<&CommandNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| TreeError::UnknownNode(id.0).into())
    }
}

fn write_flag_section(out: &mut String, title: &str, flags: &[&FlagSpec]) {
    if flags.is_empty() {
        return;
    }
    let columns: Vec<String> = flags
        .iter()
        .map(|spec| {
            let short = spec
                .shorthand_char()
                .map(|c| format!("-{c}, "))
                .unwrap_or_else(|| "    ".to_string());
            let kind = if spec.is_bool() {
                String::new()
            } else {
                format!(" {}", spec.value_type())
            };
            format!("{short}--{}{kind}", spec.name())
        })
        .collect();
    let width = columns.iter().map(String::len).max().unwrap_or(0);

    let _ = writeln!(out, "\n{title}:");
    for (column, spec) in columns.iter().zip(flags) {
        let default = match spec.value_type() {
            FlagType::Bool if spec.default_value() == "false" => String::new(),
            FlagType::String if spec.default_value().is_empty() => String::new(),
            FlagType::String => format!(" (default \"{}\")", spec.default_value()),
            _ => format!(" (default {})", spec.default_value()),
        };
        let _ = writeln!(out, "  {column:width$}   {}{default}", spec.usage_text());
    }
}

/// Typed read access to the flags visible at one command.
#[derive(Clone, Copy)]
pub struct FlagValues<'a> {
    tree: &'a CommandTree,
    node: NodeId,
}

impl<'a> FlagValues<'a> {
    pub fn new(tree: &'a CommandTree, node: NodeId) -> Self {
        Self { tree, node }
    }

    fn raw(&self, name: &str, expected: FlagType) -> std::result::Result<&'a str, ParseError> {
        let state = self
            .tree
            .flag_state(self.node, name)
            .ok_or_else(|| ParseError::UnknownFlag(name.to_string()))?;
        if state.value_type() != expected {
            return Err(ParseError::InvalidFlagValue {
                flag: name.to_string(),
                value: state.value().to_string(),
                expected: expected.name(),
            });
        }
        Ok(state.value())
    }

    fn invalid(name: &str, value: &str, expected: FlagType) -> ParseError {
        ParseError::InvalidFlagValue {
            flag: name.to_string(),
            value: value.to_string(),
            expected: expected.name(),
        }
    }

    pub fn get_bool(&self, name: &str) -> std::result::Result<bool, ParseError> {
        let raw = self.raw(name, FlagType::Bool)?;
        parse_bool(raw).ok_or_else(|| Self::invalid(name, raw, FlagType::Bool))
    }

    pub fn get_string(&self, name: &str) -> std::result::Result<String, ParseError> {
        self.raw(name, FlagType::String).map(str::to_string)
    }

    pub fn get_int(&self, name: &str) -> std::result::Result<i64, ParseError> {
        let raw = self.raw(name, FlagType::Int)?;
        raw.parse()
            .map_err(|_| Self::invalid(name, raw, FlagType::Int))
    }

    pub fn get_uint(&self, name: &str) -> std::result::Result<u64, ParseError> {
        let raw = self.raw(name, FlagType::Uint)?;
        raw.parse()
            .map_err(|_| Self::invalid(name, raw, FlagType::Uint))
    }

    pub fn get_float(&self, name: &str) -> std::result::Result<f64, ParseError> {
        let raw = self.raw(name, FlagType::Float)?;
        raw.parse()
            .map_err(|_| Self::invalid(name, raw, FlagType::Float))
    }

    pub fn get_duration(&self, name: &str) -> std::result::Result<std::time::Duration, ParseError> {
        let raw = self.raw(name, FlagType::Duration)?;
        parse_duration(raw).ok_or_else(|| Self::invalid(name, raw, FlagType::Duration))
    }

    /// Whether the flag was set explicitly since the last reset.
    pub fn changed(&self, name: &str) -> bool {
        self.tree
            .flag_state(self.node, name)
            .is_some_and(FlagState::is_changed)
    }
}
