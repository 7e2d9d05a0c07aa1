//! cmdprompt demo shell
//!
//! Runs an interactive prompt over a small sample command tree, showing
//! subcommand, flag, flag-value and dynamic suggestions.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! cmdprompt
//!
//! # Keep flag values between commands
//! cmdprompt --persist-flags
//! ```

use std::sync::Arc;

use cmdprompt::cli::CliInterface;
use cmdprompt::error::{ExecutionError, PromptError, Result};
use cmdprompt::repl::{Document, ReplEngine, Session, SharedSession, Suggestion};
use cmdprompt::tree::{CommandSpec, CommandTree, DynamicSuggestionKey, FlagSpec};
use cmdprompt::{EngineOptions, Invocation};

const FOOD_SUGGESTIONS: &str = "food";

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or start the shell
fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand()? {
        return Ok(());
    }

    cli.print_banner();

    let session = create_session(&cli)?;
    let mut repl = ReplEngine::new(
        SharedSession::new(session),
        &cli.config().history,
        !cli.args().no_color,
    )?;
    repl.run()?;

    if !cli.args().quiet {
        println!("Goodbye!");
    }
    Ok(())
}

/// Build the session over the sample tree
fn create_session(cli: &CliInterface) -> Result<Session> {
    let mut options = EngineOptions::from_config(&cli.config().engine);
    options.dynamic_suggestions = Some(Arc::new(dynamic_suggestions));
    // keep the prompt alive when a command fails
    options.on_error = Some(Arc::new(|err: &PromptError| eprintln!("Error: {}", err)));

    Session::new(sample_tree()?, options)
}

/// root -> {get (alias eat) -> {food, object}, error}
fn sample_tree() -> Result<CommandTree> {
    let mut tree = CommandTree::new(CommandSpec::new("cmdprompt"));
    let root = tree.root();

    let get = tree.add_command(root, CommandSpec::new("get").alias("eat").short("Get something"))?;
    tree.add_flag(
        get,
        FlagSpec::bool("verbose", false)
            .shorthand('v')
            .usage("Verbose log")
            .persistent(),
    )?;
    tree.add_flag(
        get,
        FlagSpec::string("name", "John")
            .shorthand('n')
            .usage("name of the person")
            .persistent(),
    )?;
    tree.register_flag_completion(get, "name", |_, _| {
        vec!["John".to_string(), "Mary".to_string(), "Anne".to_string()]
    })?;

    tree.add_command(
        get,
        CommandSpec::new("food")
            .short("Get some food")
            .dynamic_suggestions(FOOD_SUGGESTIONS)
            .run(get_food),
    )?;
    tree.add_command(
        get,
        CommandSpec::new("object").short("Get an object").run(|inv| {
            if inv.flags().get_bool("verbose")? {
                println!("Here you go, an object for {}", inv.flags().get_string("name")?);
            } else {
                println!("object");
            }
            Ok(())
        }),
    )?;

    tree.add_command(
        root,
        CommandSpec::new("error").short("Returns error").run(|inv| {
            Err(ExecutionError::CommandFailed {
                command: inv.path(),
                message: "errors go to the error handler, which decides whether to continue"
                    .to_string(),
            }
            .into())
        }),
    )?;

    Ok(tree)
}

fn get_food(inv: &Invocation<'_>) -> Result<()> {
    let flags = inv.flags();
    let verbose = flags.get_bool("verbose")?;
    let name = flags.get_string("name")?;
    for item in inv.args() {
        if verbose {
            println!("Here you go, take this from {}: {}", name, item);
        } else {
            println!("{}", item);
        }
    }
    Ok(())
}

fn dynamic_suggestions(key: &DynamicSuggestionKey, _doc: &Document) -> Vec<Suggestion> {
    match key.as_str() {
        FOOD_SUGGESTIONS => vec![
            Suggestion::new("apple", "Green apple"),
            Suggestion::new("tomato", "Red tomato"),
        ],
        _ => Vec::new(),
    }
}

/// Initialize logging system based on the configured level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity already applied to the config
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    // Build subscriber with level filter; stderr keeps logs off the prompt line
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_tree_suggestions() {
        let mut session = Session::new(sample_tree().unwrap(), EngineOptions {
            dynamic_suggestions: Some(Arc::new(dynamic_suggestions)),
            ..Default::default()
        })
        .unwrap();

        let texts = |s: Vec<Suggestion>| s.into_iter().map(|s| s.text).collect::<Vec<_>>();
        assert_eq!(texts(session.suggest("eat ", 4)), vec!["food", "object"]);
        assert_eq!(texts(session.suggest("get food ", 9)), vec!["apple", "tomato"]);
        assert_eq!(
            texts(session.suggest("get food --name ", 16)),
            vec!["John", "Mary", "Anne"]
        );
    }

    #[test]
    fn test_error_command_fails() {
        let mut session = Session::new(sample_tree().unwrap(), EngineOptions {
            on_error: Some(Arc::new(|_: &PromptError| {})),
            ..Default::default()
        })
        .unwrap();
        assert!(session.execute("error").is_err());
        assert!(session.execute("get food apple -v").is_ok());
    }
}
