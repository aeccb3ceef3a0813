//! `formcase completions` command - Shell completion scripts
//!
//! Prints a completion script for the whole `formcase` command tree to
//! stdout, including the `config` subcommands and the connection flags
//! shared by `validate` and `upload`.
//!
//! ```bash
//! # bash, current session
//! source <(formcase completions bash)
//!
//! # zsh, any directory on $fpath
//! formcase completions zsh > ~/.zfunc/_formcase
//!
//! # fish
//! formcase completions fish > ~/.config/fish/completions/formcase.fish
//!
//! # PowerShell
//! formcase completions powershell | Out-String | Invoke-Expression
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `args.shell` to stdout
pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "formcase", &mut io::stdout());
    Ok(())
}
