//! `formcase upload` command - Create Test Case work items in Azure DevOps

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    config_with_connection, load_and_build, resolve_credentials, warn_null_tiers, write_file,
};
use crate::cli::{ConnectionArgs, GlobalOpts};
use crate::core::devops::DevOpsClient;
use crate::core::export::results_csv;
use crate::core::text::truncate;
use crate::core::upload::{upload, UploadProgress, UploadResultRow, UploadSummary};

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Requirements CSV file
    pub file: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Simulate the upload without creating work items
    #[arg(long)]
    pub dry_run: bool,

    /// Area path for every work item (overrides the CSV and config)
    #[arg(long)]
    pub area_path: Option<String>,

    /// Iteration path for every work item (overrides the CSV and config)
    #[arg(long)]
    pub iteration_path: Option<String>,

    /// Test cases per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Write the per-case results to this CSV file
    #[arg(long)]
    pub results: Option<PathBuf>,
}

pub fn run(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let processed = load_and_build(&args.file)?;
    warn_null_tiers(&processed);

    let config = config_with_connection(&args.connection);
    let credentials = resolve_credentials(&args.connection, &config)?;

    if !args.dry_run {
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(miette::miette!(
                help = "Pass --organization/--project/--pat or set FORMCASE_ORGANIZATION, FORMCASE_PROJECT and FORMCASE_PAT",
                "Missing connection settings: {}",
                missing.join(", ")
            ));
        }
    }

    let mut overrides = config.overrides();
    if args.area_path.is_some() {
        overrides.area_path = args.area_path.clone();
    }
    if args.iteration_path.is_some() {
        overrides.iteration_path = args.iteration_path.clone();
    }

    let mut policy = config.upload_policy();
    if let Some(size) = args.batch_size {
        policy.batch_size = size;
    }

    let client = DevOpsClient::new(credentials, config.api_settings())
        .map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Uploading {} test case(s){}",
        style("→").blue(),
        style(processed.test_cases.len()).cyan(),
        if args.dry_run {
            style(" (dry run)").dim().to_string()
        } else {
            String::new()
        }
    );

    let quiet = global.quiet;
    let results = upload(
        &client,
        &processed.test_cases,
        &overrides,
        args.dry_run,
        &policy,
        |progress| {
            if !quiet {
                print_progress(progress);
            }
        },
    );

    println!();
    print_results(&results);

    if let Some(path) = &args.results {
        let csv = results_csv(&results).map_err(|e| miette::miette!("{}", e))?;
        write_file(path, &csv, "Upload results")?;
    }

    let summary = UploadSummary::from_results(&results);
    print_summary(&summary, args.dry_run);

    if summary.failed > 0 {
        return Err(miette::miette!(
            "{} of {} test case(s) failed to upload",
            summary.failed,
            summary.total
        ));
    }

    Ok(())
}

fn print_progress(progress: &UploadProgress) {
    let batch = if progress.batch_count > 1 {
        format!(" [batch {}/{}]", progress.batch, progress.batch_count)
    } else {
        String::new()
    };
    eprintln!(
        "{} {:>5.1}% {}/{}{} {}",
        style("·").dim(),
        progress.fraction() * 100.0,
        progress.current,
        progress.total,
        style(batch).dim(),
        progress.message
    );
}

fn print_results(results: &[UploadResultRow]) {
    let mut table = Builder::default();
    table.push_record(["Batch", "Title", "Status", "Work Item ID", "Steps", "Time"]);
    for row in results {
        table.push_record([
            row.batch_label(),
            truncate(&row.title, 50),
            row.status.to_string(),
            row.work_item_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            row.step_count.to_string(),
            row.time_label(),
        ]);
    }
    println!("{}", table.build().with(Style::rounded()));
}

fn print_summary(summary: &UploadSummary, dry_run: bool) {
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Upload Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Total:       {}", style(summary.total).cyan());
    if dry_run {
        println!("  Dry run:     {}", style(summary.dry_run).yellow());
    } else {
        println!("  Successful:  {}", style(summary.successful).green());
    }
    if summary.failed > 0 {
        println!("  Failed:      {}", style(summary.failed).red());
    }
    if dry_run {
        println!();
        println!(
            "{}",
            style("Dry run complete. No work items were created.").yellow()
        );
    }
}
