//! `formcase stats` command - Overview of a requirements CSV

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::loader::load_table;
use crate::core::stats::TableStats;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Requirements CSV file
    pub file: PathBuf,
}

pub fn run(args: StatsArgs, _global: &GlobalOpts) -> Result<()> {
    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }
    let table = load_table(&args.file).map_err(|e| miette::miette!("{}", e))?;
    let stats = TableStats::from_table(&table);

    let mut summary = Builder::default();
    summary.push_record(["Metric", "Count"]);
    summary.push_record(["Total Rows".to_string(), stats.rows.to_string()]);
    summary.push_record(["Total Columns".to_string(), stats.columns.to_string()]);
    summary.push_record(["Unique Forms".to_string(), stats.unique_forms.to_string()]);
    println!("{}", summary.build().with(Style::rounded()));

    if !stats.classifications.is_empty() {
        println!();
        println!("{}", style("Classification Breakdown").bold());
        let mut breakdown = Builder::default();
        breakdown.push_record(["Classification", "Items"]);
        for (classification, count) in &stats.classifications {
            breakdown.push_record([classification.clone(), count.to_string()]);
        }
        println!("{}", breakdown.build().with(Style::rounded()));
    }

    if !stats.missing_columns.is_empty() {
        println!();
        println!(
            "{} Missing required columns: {}",
            style("✗").red(),
            style(stats.missing_columns.join(", ")).red()
        );
    }

    Ok(())
}
