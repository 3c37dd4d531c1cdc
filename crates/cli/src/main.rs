// rollcall CLI - post attendance submissions to the ledger

mod exit_codes;
mod post;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

const DEFAULT_CONFIG: &str = "rollcall.toml";

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Reconcile attendance sign-ups against the activity catalog and roster, and post them to the ledger")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile pending submissions and append them to the ledger
    #[command(after_help = "\
Examples:
  rollcall post
  rollcall post --config troop42/rollcall.toml
  rollcall post --dry-run --json
  rollcall post --output last-run.json --strict")]
    Post {
        /// Path to the posting config
        #[arg(long, short = 'c', env = "ROLLCALL_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Compute the report without writing the ledger or marking rows
        #[arg(long)]
        dry_run: bool,

        /// Output the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when any submission or name is unresolved
        #[arg(long)]
        strict: bool,
    },

    /// Check the config and reference tables without writing anything
    #[command(after_help = "\
Examples:
  rollcall validate
  rollcall validate --config troop42/rollcall.toml")]
    Validate {
        /// Path to the posting config
        #[arg(long, short = 'c', env = "ROLLCALL_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Write a starter config with the default column layout
    Init {
        /// Where to write the config
        #[arg(long, short = 'c', default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  rollcall-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  rollcall-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: rollcall <command> [options]");
            eprintln!("       rollcall --help for more information");
            Ok(())
        }
        Some(Commands::Post { config, dry_run, json, output, strict }) => {
            post::cmd_post(config, dry_run, json, output, strict)
        }
        Some(Commands::Validate { config }) => post::cmd_validate(config),
        Some(Commands::Init { config, force }) => post::cmd_init(config, force),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
