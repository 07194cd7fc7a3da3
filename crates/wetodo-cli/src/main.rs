#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wetodo_core::config::{Overrides, resolve_config};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "wetodo: shared to-do lists built from a command log",
    long_about = None
)]
struct Cli {
    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Directory holding the lists (overrides the config file).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Act as this user, e.g. `local:1` or `gh:1234`.
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            json: self.json,
            format: self.format.map(|mode| mode.as_str().to_string()),
            data_dir: self.data_dir.clone(),
            user: self.user.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lists",
        about = "Create a new list",
        after_help = "EXAMPLES:\n    wetodo new \"Groceries\"\n    wetodo new \"Work*\"   # trailing * marks a favorite"
    )]
    New(cmd::list::NewArgs),

    #[command(next_help_heading = "Lists", about = "Show all stored lists")]
    Lists,

    #[command(
        next_help_heading = "Lists",
        about = "Show a list and its entries",
        after_help = "EXAMPLES:\n    wetodo show 3f2a\n    wetodo show 3f2a --json"
    )]
    Show(cmd::list::ListArg),

    #[command(next_help_heading = "Lists", about = "Rename a list")]
    Retitle(cmd::list::RetitleArgs),

    #[command(
        next_help_heading = "Lists",
        about = "Remove every entry and compact the log",
        long_about = "Remove every entry and collapse the list's history into a single CLEAR record. This cannot be undone."
    )]
    Clear(cmd::list::ListArg),

    #[command(next_help_heading = "Lists", about = "Print a list's command log")]
    Log(cmd::list::ListArg),

    #[command(next_help_heading = "Lists", about = "Mark or unmark a list as favorite")]
    Favorite(cmd::list::FavoriteArgs),

    #[command(
        next_help_heading = "Lists",
        about = "Share a list with another user",
        after_help = "EXAMPLES:\n    wetodo share 3f2a gh:1234"
    )]
    Share(cmd::list::ShareArgs),

    #[command(next_help_heading = "Lists", about = "Delete a stored list")]
    Remove(cmd::list::ListArg),

    #[command(
        next_help_heading = "Entries",
        about = "Add an entry to a list",
        after_help = "EXAMPLES:\n    wetodo add 3f2a \"Buy milk\"\n    wetodo add 3f2a \"Remember the receipt\" --kind note"
    )]
    Add(cmd::entry::AddArgs),

    #[command(next_help_heading = "Entries", about = "Toggle an entry's checked state")]
    Check(cmd::entry::EntryArgs),

    #[command(next_help_heading = "Entries", about = "Change an entry's title")]
    Rename(cmd::entry::RenameArgs),

    #[command(next_help_heading = "Entries", about = "Change an entry's description")]
    Describe(cmd::entry::DescribeArgs),

    #[command(
        next_help_heading = "Entries",
        about = "Move an entry to another position",
        after_help = "EXAMPLES:\n    # Move entry 4 to the top\n    wetodo move 3f2a 4 0"
    )]
    Move(cmd::entry::MoveArgs),

    #[command(next_help_heading = "Entries", about = "Delete an entry")]
    Delete(cmd::entry::EntryArgs),

    #[command(
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    wetodo completions bash\n    wetodo completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WETODO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "wetodo=debug,info"
        } else {
            "wetodo=info,warn"
        })
    });

    let format = env::var("WETODO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args, &mut command);
    }

    let config = resolve_config(&cli.overrides())?;
    let session = cmd::Session::open(config).await?;

    match &cli.command {
        Commands::New(args) => cmd::list::run_new(args, &session).await,
        Commands::Lists => cmd::list::run_lists(&session).await,
        Commands::Show(args) => cmd::list::run_show(args, &session).await,
        Commands::Retitle(args) => cmd::list::run_retitle(args, &session).await,
        Commands::Clear(args) => cmd::list::run_clear(args, &session).await,
        Commands::Log(args) => cmd::list::run_log(args, &session).await,
        Commands::Favorite(args) => cmd::list::run_favorite(args, &session).await,
        Commands::Share(args) => cmd::list::run_share(args, &session).await,
        Commands::Remove(args) => cmd::list::run_remove(args, &session).await,
        Commands::Add(args) => cmd::entry::run_add(args, &session).await,
        Commands::Check(args) => cmd::entry::run_check(args, &session).await,
        Commands::Rename(args) => cmd::entry::run_rename(args, &session).await,
        Commands::Describe(args) => cmd::entry::run_describe(args, &session).await,
        Commands::Move(args) => cmd::entry::run_move(args, &session).await,
        Commands::Delete(args) => cmd::entry::run_delete(args, &session).await,
        Commands::Completions(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["wetodo", "--json", "lists"]);
        assert!(cli.overrides().json);

        let cli = Cli::parse_from(["wetodo", "lists", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_becomes_override() {
        let cli = Cli::parse_from(["wetodo", "--format", "text", "lists"]);
        assert_eq!(cli.overrides().format.as_deref(), Some("text"));
    }

    #[test]
    fn data_dir_and_user_flags_are_global() {
        let cli = Cli::parse_from([
            "wetodo", "show", "abc", "--data-dir", "/tmp/x", "--user", "gh:9",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(overrides.user.as_deref(), Some("gh:9"));
    }

    #[test]
    fn add_defaults_to_check_kind() {
        let cli = Cli::parse_from(["wetodo", "add", "abc", "Buy milk"]);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.kind, "check");
                assert_eq!(args.title, "Buy milk");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["wetodo", "new", "t"],
            vec!["wetodo", "lists"],
            vec!["wetodo", "show", "l"],
            vec!["wetodo", "retitle", "l", "t"],
            vec!["wetodo", "clear", "l"],
            vec!["wetodo", "log", "l"],
            vec!["wetodo", "favorite", "l", "--off"],
            vec!["wetodo", "share", "l", "gh:1"],
            vec!["wetodo", "remove", "l"],
            vec!["wetodo", "add", "l", "t", "--kind", "note"],
            vec!["wetodo", "check", "l", "0"],
            vec!["wetodo", "rename", "l", "0", "t"],
            vec!["wetodo", "describe", "l", "0", "d"],
            vec!["wetodo", "move", "l", "0", "2"],
            vec!["wetodo", "delete", "l", "0"],
            vec!["wetodo", "completions", "bash"],
            vec!["wetodo", "completions", "zsh", "--output", "_wetodo"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
