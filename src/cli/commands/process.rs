//! `formcase process` command - Build test cases and export them

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{load_and_build, warn_null_tiers, write_file};
use crate::cli::GlobalOpts;
use crate::core::export::serialize_with;
use crate::core::stats::CaseStats;
use crate::core::text::truncate;
use crate::core::Config;
use crate::entities::test_case::TestCase;

/// Steps shown per previewed test case
const PREVIEW_STEPS: usize = 3;
/// Width of previewed step actions
const PREVIEW_ACTION_WIDTH: usize = 80;

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Requirements CSV file
    pub file: PathBuf,

    /// Write the bulk-import CSV to this file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Print the processed test cases as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Number of test cases to preview
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    /// Assignee written to the export (overrides config)
    #[arg(long)]
    pub assigned_to: Option<String>,
}

pub fn run(args: ProcessArgs, global: &GlobalOpts) -> Result<()> {
    let processed = load_and_build(&args.file)?;
    let config = Config::load();

    if let Some(path) = &args.output {
        let mut options = config.export_options();
        if args.assigned_to.is_some() {
            options.assigned_to = args.assigned_to.clone();
        }
        let csv = serialize_with(&processed.test_cases, &options)
            .map_err(|e| miette::miette!("{}", e))?;
        write_file(path, &csv, "Processed test cases")?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&processed.test_cases).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    print_summary(&processed.test_cases);
    warn_null_tiers(&processed);

    if !global.quiet && args.preview > 0 {
        print_preview(&processed.test_cases, args.preview);
    }

    Ok(())
}

fn print_summary(cases: &[TestCase]) {
    let stats = CaseStats::from_cases(cases);

    println!(
        "{} {}",
        style("Total Test Cases:").bold(),
        style(stats.total).cyan()
    );
    let mut summary = Builder::default();
    summary.push_record(["Type", "Count"]);
    for (kind, count) in &stats.by_kind {
        summary.push_record([kind.label().to_string(), count.to_string()]);
    }
    summary.push_record(["Total Steps".to_string(), stats.total_steps.to_string()]);
    println!("{}", summary.build().with(Style::rounded()));
}

fn print_preview(cases: &[TestCase], limit: usize) {
    for (i, case) in cases.iter().take(limit).enumerate() {
        println!();
        println!(
            "{} {}",
            style(format!("Example {}:", i + 1)).bold(),
            style(&case.title).cyan()
        );
        println!("  Type:  {}", case.kind.label());
        println!("  Form:  {}", case.form_name);
        if !case.testing_tier.is_empty() {
            println!("  Tier:  {}", case.testing_tier);
        }
        println!("  Steps: {}", case.step_count());
        if case.steps.is_empty() {
            println!("  {}", style("No steps").dim());
        }
        for step in case.steps.iter().take(PREVIEW_STEPS) {
            println!(
                "    {} {}",
                style(format!("Step {}:", step.step_number)).dim(),
                truncate(&step.action, PREVIEW_ACTION_WIDTH)
            );
        }
        if case.steps.len() > PREVIEW_STEPS {
            println!(
                "    {}",
                style(format!("... and {} more steps", case.steps.len() - PREVIEW_STEPS)).dim()
            );
        }
    }

    if cases.len() > limit {
        println!();
        println!(
            "{}",
            style(format!("... {} more test cases", cases.len() - limit)).dim()
        );
    }
}
