use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use formcase::cli::{Cli, Commands, GlobalOpts};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping to `head` terminates quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Stats(args) => formcase::cli::commands::stats::run(args, &global),
        Commands::Process(args) => formcase::cli::commands::process::run(args, &global),
        Commands::Validate(args) => formcase::cli::commands::validate::run(args, &global),
        Commands::Upload(args) => formcase::cli::commands::upload::run(args, &global),
        Commands::Config(cmd) => formcase::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => formcase::cli::commands::completions::run(args),
    }
}

/// Log to stderr; `FORMCASE_LOG` wins over `-v`
fn init_tracing(global: &GlobalOpts) {
    let default_level = if global.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("FORMCASE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("formcase={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
