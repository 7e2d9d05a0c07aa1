//! Command execution for submitted lines
//!
//! This module turns the tokens of a submitted line into a command run:
//! - `router`: resolves the command, assigns flags and calls the runner
//! - `args`: flag and positional argument parsing
//!
//! Runners receive an [`Invocation`] giving read access to the command, its
//! positional arguments and typed flag values.

mod args;
mod router;

pub use args::{ParsedArgs, parse_args};
pub use router::{Builtins, CommandRouter};

use crate::tree::{CommandNode, CommandTree, FlagValues, NodeId};

/// Result of executing a submitted line
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The command's runner completed successfully.
    Ran(NodeId),

    /// Usage text for a command: requested with help, or the command only
    /// groups subcommands.
    Usage { node: NodeId, text: String },

    /// The built-in exit command was submitted.
    Exit,
}

impl ExecutionOutcome {
    /// Command the outcome refers to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            ExecutionOutcome::Ran(node) | ExecutionOutcome::Usage { node, .. } => Some(*node),
            ExecutionOutcome::Exit => None,
        }
    }
}

/// Context handed to a command runner
pub struct Invocation<'a> {
    tree: &'a CommandTree,
    node: NodeId,
    args: Vec<String>,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(tree: &'a CommandTree, node: NodeId, args: Vec<String>) -> Self {
        Self { tree, node, args }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn command(&self) -> &'a CommandNode {
        self.tree.node(self.node)
    }

    /// Space separated path from the root, e.g. `app get food`.
    pub fn path(&self) -> String {
        self.tree.command_path(self.node)
    }

    /// Positional arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn flags(&self) -> FlagValues<'a> {
        FlagValues::new(self.tree, self.node)
    }

    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }
}
