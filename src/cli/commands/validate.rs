//! `formcase validate` command - Check Azure DevOps connectivity

use console::style;
use miette::Result;

use crate::cli::helpers::{config_with_connection, resolve_credentials};
use crate::cli::{ConnectionArgs, GlobalOpts};
use crate::core::connection::validate;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub fn run(args: ValidateArgs, _global: &GlobalOpts) -> Result<()> {
    let config = config_with_connection(&args.connection);
    let credentials = resolve_credentials(&args.connection, &config)?;

    let check = validate(&credentials, &config.api_settings());
    if check.success {
        println!("{} {}", style("✓").green(), check.message);
        Ok(())
    } else {
        eprintln!("{} {}", style("✗").red(), check.message);
        Err(miette::miette!("Connection check failed"))
    }
}
