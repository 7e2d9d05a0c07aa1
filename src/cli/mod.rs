//! Command-line interface for the cmdprompt demo shell
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Applying argument overrides on top of the configuration file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, FlagPolicy, LogLevel};
use crate::error::Result;

/// Interactive prompt with completion for nested command trees
#[derive(Parser, Debug)]
#[command(
    name = "cmdprompt",
    version,
    about = "Interactive prompt with completion for nested command trees",
    long_about = "An interactive shell over a tree of commands and flags, with context-aware
suggestions for subcommands, flag names and flag values."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Quiet mode (no banner, errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Disable colored prompt
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Keep flag values between commands
    #[arg(long)]
    pub persist_flags: bool,

    /// Suggest hidden commands and flags
    #[arg(long)]
    pub show_hidden: bool,

    /// How long flag-value suggestions are reused
    #[arg(long, value_name = "MILLISECONDS")]
    pub cache_interval: Option<u64>,

    /// Do not read or write the history file
    #[arg(long)]
    pub no_history: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for cmdprompt
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load the configuration
    ///
    /// # Returns
    /// * `Result<Self>` - CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        // CLI arguments override file values
        Self::apply_args_to_config(&mut config, args);

        Ok(config)
    }

    /// Get the configuration
    ///
    /// # Returns
    /// * `&Config` - Reference to configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    ///
    /// # Returns
    /// * `&CliArgs` - Reference to arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    /// * `args` - Parsed arguments
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_engine_args(config, args);
        Self::apply_logging_args(config, args);

        if args.no_history {
            config.history.persist = false;
        }
    }

    fn apply_engine_args(config: &mut Config, args: &CliArgs) {
        if args.persist_flags {
            config.engine.flag_policy = FlagPolicy::Persist;
        }

        if args.show_hidden {
            config.engine.show_hidden_commands = true;
            config.engine.show_hidden_flags = true;
        }

        if let Some(interval) = args.cache_interval {
            config.engine.cache_interval_ms = interval;
        }
    }

    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if a subcommand ran and the shell should not start
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Config { show, validate }) => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn show_version(&self) {
        println!("cmdprompt version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show {
            self.show_config()?;
        }

        Ok(())
    }

    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist");
            return;
        }

        match Config::load_from_file(Some(&path)) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("Configuration is valid"),
                Err(e) => println!("Configuration validation failed: {}", e),
            },
            Err(e) => println!("Failed to load configuration: {}", e),
        }
    }

    fn show_config(&self) -> Result<()> {
        println!("Configuration file: {}", self.get_config_path().display());
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }

    /// Print banner with version and usage hints
    pub fn print_banner(&self) {
        if !self.args.quiet {
            println!("cmdprompt {}", env!("CARGO_PKG_VERSION"));
            println!("Press Tab for suggestions, type 'exit' or Ctrl-D to quit.");
        }
    }
}
