//! Command router: resolves a submitted token sequence and runs the command
//!
//! Routing order:
//! 1. walk the tree to the deepest matching command
//! 2. built-in `exit` short-circuits
//! 3. parse and assign flags
//! 4. `--help` or the built-in `help` command produce usage text
//! 5. runnable commands invoke their runner; others print usage or reject
//!    stray positional arguments

use std::time::Instant;
use tracing::debug;

use crate::error::{ExecutionError, ParseError, PromptError, Result};
use crate::tree::{CommandTree, FlagKey, NodeId};

use super::args::parse_args;
use super::{ExecutionOutcome, Invocation};

/// Commands and flags whose behavior is provided by the router itself.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    /// Command that ends the interactive session.
    pub exit: Option<NodeId>,
    /// Command that prints usage for the path given as its arguments.
    pub help: Option<NodeId>,
    /// Boolean flag that prints usage instead of running the command.
    pub help_flag: Option<FlagKey>,
}

/// Router that dispatches a token sequence to the matching command
pub struct CommandRouter<'t> {
    /// Command tree being executed against
    tree: &'t mut CommandTree,

    /// Built-in commands and flags
    builtins: &'t Builtins,
}

impl<'t> CommandRouter<'t> {
    /// Create a new command router
    ///
    /// # Arguments
    /// * `tree` - Command tree whose flag values will be updated
    /// * `builtins` - Built-in commands registered on the tree
    pub fn new(tree: &'t mut CommandTree, builtins: &'t Builtins) -> Self {
        Self { tree, builtins }
    }

    /// Route a token sequence to its command
    ///
    /// # Arguments
    /// * `args` - Tokens of the submitted line
    ///
    /// # Returns
    /// * `Result<ExecutionOutcome>` - What happened, or the parse/run error
    pub fn route(&mut self, args: &[String]) -> Result<ExecutionOutcome> {
        let start = Instant::now();
        let (node, rest) = self.tree.find(args);
        debug!("Routing to '{}' with {:?}", self.tree.command_path(node), rest);

        if self.builtins.exit == Some(node) {
            return Ok(ExecutionOutcome::Exit);
        }

        let parsed = parse_args(&*self.tree, node, &rest)?;
        // a rejected value leaves no earlier assignment of the same line behind
        let snapshot = self.tree.flags().snapshot();
        for (key, value) in &parsed.assignments {
            if let Err(e) = self.tree.flags_mut().set(key, value) {
                self.tree.flags_mut().restore(snapshot);
                return Err(e.into());
            }
        }

        let outcome = self.dispatch(node, parsed.positionals);
        if let Some(key) = &self.builtins.help_flag {
            self.tree.flags_mut().reset(key);
        }
        let outcome = outcome?;
        debug!(
            "Command '{}' finished in {}ms",
            self.tree.command_path(node),
            start.elapsed().as_millis()
        );
        Ok(outcome)
    }

    fn dispatch(&self, node: NodeId, positionals: Vec<String>) -> Result<ExecutionOutcome> {
        let tree: &CommandTree = &*self.tree;

        let help_requested = self
            .builtins
            .help_flag
            .as_ref()
            .and_then(|key| tree.flags().get(key))
            .is_some_and(|state| state.value() == "true");
        if help_requested {
            return Ok(ExecutionOutcome::Usage {
                node,
                text: tree.usage(node),
            });
        }

        if self.builtins.help == Some(node) {
            let (target, _) = tree.find(&positionals);
            return Ok(ExecutionOutcome::Usage {
                node: target,
                text: tree.usage(target),
            });
        }

        let command = tree.node(node);
        let Some(runner) = command.runner().cloned() else {
            if let Some(arg) = positionals.into_iter().next() {
                return Err(ParseError::UnknownCommand {
                    command: tree.command_path(node),
                    arg,
                }
                .into());
            }
            return Ok(ExecutionOutcome::Usage {
                node,
                text: tree.usage(node),
            });
        };

        let invocation = Invocation::new(tree, node, positionals);
        match runner(&invocation) {
            Ok(()) => Ok(ExecutionOutcome::Ran(node)),
            Err(PromptError::Generic(message)) => Err(ExecutionError::CommandFailed {
                command: tree.command_path(node),
                message,
            }
            .into()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::tree::{CommandSpec, FlagSpec};

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    struct Fixture {
        tree: CommandTree,
        builtins: Builtins,
        seen: Arc<Mutex<Vec<String>>>,
        food: NodeId,
    }

    fn fixture() -> Fixture {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut tree = CommandTree::new(CommandSpec::new("root"));
        let get = tree
            .add_command(tree.root(), CommandSpec::new("get").short("Get something"))
            .unwrap();

        let log = seen.clone();
        let food = tree
            .add_command(
                get,
                CommandSpec::new("food").run(move |inv| {
                    let name = inv.flags().get_string("name")?;
                    let verbose = inv.flags().get_bool("verbose")?;
                    log.lock()
                        .unwrap()
                        .push(format!("{name}:{verbose}:{}", inv.args().join(",")));
                    Ok(())
                }),
            )
            .unwrap();
        tree.add_command(
            tree.root(),
            CommandSpec::new("error").run(|_| Err("boom".into())),
        )
        .unwrap();
        let exit = tree
            .add_command(tree.root(), CommandSpec::new("exit"))
            .unwrap();
        let help = tree
            .add_command(tree.root(), CommandSpec::new("help"))
            .unwrap();
        let help_flag = tree
            .add_flag(
                tree.root(),
                FlagSpec::bool("help", false).shorthand('h').persistent(),
            )
            .unwrap();
        tree.add_flag(get, FlagSpec::bool("verbose", false).shorthand('v').persistent())
            .unwrap();
        tree.add_flag(food, FlagSpec::string("name", "John").shorthand('n'))
            .unwrap();

        Fixture {
            tree,
            builtins: Builtins {
                exit: Some(exit),
                help: Some(help),
                help_flag: Some(help_flag),
            },
            seen,
            food,
        }
    }

    #[test]
    fn test_runs_command_with_flags_and_args() {
        let mut fx = fixture();
        let outcome = CommandRouter::new(&mut fx.tree, &fx.builtins)
            .route(&tokens("get -v food --name Mary apple pear"))
            .unwrap();

        assert_eq!(outcome, ExecutionOutcome::Ran(fx.food));
        assert_eq!(*fx.seen.lock().unwrap(), vec!["Mary:true:apple,pear"]);
        assert_eq!(fx.tree.flag_state(fx.food, "name").unwrap().value(), "Mary");
    }

    #[test]
    fn test_non_runnable_prints_usage() {
        let mut fx = fixture();
        let outcome = CommandRouter::new(&mut fx.tree, &fx.builtins)
            .route(&tokens("get"))
            .unwrap();
        match outcome {
            ExecutionOutcome::Usage { text, .. } => assert!(text.contains("Available Commands:")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_unknown_subcommand() {
        let mut fx = fixture();
        let err = CommandRouter::new(&mut fx.tree, &fx.builtins)
            .route(&tokens("get nothing"))
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown command \"nothing\" for \"root get\"");
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let mut fx = fixture();
        let err = CommandRouter::new(&mut fx.tree, &fx.builtins)
            .route(&tokens("get food --verbose=maybe"))
            .unwrap_err();
        assert!(matches!(err, PromptError::Parse(ParseError::InvalidFlagValue { .. })));
    }

    #[test]
    fn test_rejected_value_rolls_back_line() {
        let mut fx = fixture();
        CommandRouter::new(&mut fx.tree, &fx.builtins)
            .route(&tokens("get food --name Mary --verbose=maybe"))
            .unwrap_err();
        let name = fx.tree.flag_state(fx.food, "name").unwrap();
        assert_eq!(name.value(), "John");
        assert!(!name.is_changed());
    }

    #[test]
    fn test_runner_error_is_wrapped() {
        let mut fx = fixture();
        let err = CommandRouter::new(&mut fx.tree, &fx.builtins)
            .route(&tokens("error"))
            .unwrap_err();
        assert_eq!(err.to_string(), "root error: boom");
    }

    #[test]
    fn test_builtins() {
        let mut fx = fixture();
        let mut router = CommandRouter::new(&mut fx.tree, &fx.builtins);

        assert_eq!(router.route(&tokens("exit")).unwrap(), ExecutionOutcome::Exit);

        match router.route(&tokens("help get food")).unwrap() {
            ExecutionOutcome::Usage { node, text } => {
                assert_eq!(node, fx.food);
                assert!(text.contains("--name"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        match router.route(&tokens("get food -h")).unwrap() {
            ExecutionOutcome::Usage { node, .. } => assert_eq!(node, fx.food),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(fx.seen.lock().unwrap().is_empty());
    }
}
