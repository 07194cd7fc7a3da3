//! `wetodo completions`: shell completion scripts.

use anyhow::{Context, Result};
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;
use std::path::PathBuf;

/// Name the scripts complete, whatever the binary was invoked as.
const BIN_NAME: &str = "wetodo";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the script for.
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Render the completion script for `shell`.
#[must_use]
pub fn script(shell: Shell, command: &mut clap::Command) -> Vec<u8> {
    let mut buf = Vec::new();
    generate(shell, command, BIN_NAME, &mut buf);
    buf
}

/// Print the completion script, or write it to `--output`.
///
/// # Errors
///
/// Returns an error if the script cannot be written.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> Result<()> {
    let script = script(args.shell, command);
    match &args.output {
        Some(path) => std::fs::write(path, &script)
            .with_context(|| format!("Failed to write completions to {}", path.display())),
        None => std::io::stdout()
            .lock()
            .write_all(&script)
            .context("Failed to write completions to stdout"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    fn command() -> Command {
        Command::new("wetodo").subcommand(Command::new("show").arg(Arg::new("list")))
    }

    #[test]
    fn bash_script_mentions_binary_and_subcommands() {
        let text = String::from_utf8(script(Shell::Bash, &mut command())).unwrap();
        assert!(text.contains("wetodo"));
        assert!(text.contains("show"));
    }

    #[test]
    fn output_flag_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wetodo.zsh");
        let args = CompletionsArgs {
            shell: Shell::Zsh,
            output: Some(path.clone()),
        };
        run_completions(&args, &mut command()).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("wetodo"));
    }
}
