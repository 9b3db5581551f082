//! TrendForge: daily sales trend analysis CLI
//!
//! This is the main entrypoint that orchestrates loading the transaction log,
//! mining sequential patterns, scoring association rules, and writing the report.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use trendforge::{report, run_analysis, Args, AnalysisReport};

/// Initialize tracing subscriber for diagnostics on stderr
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("Analysis failed: {err:#}");
        std::process::exit(1);
    }
}

/// Run the full analysis pipeline
fn run(args: &Args) -> Result<()> {
    println!("=== Sales Trend Analysis ===\n");

    let start_time = Instant::now();

    let config = args.analysis_config().context("invalid configuration")?;
    let miner = args.build_miner().context("cannot set up the pattern miner")?;

    if args.verbose {
        println!("Input file: {}", args.input.display());
        println!("Miner: {}", miner.name());
        println!("Minimum support: {}", config.min_support);
        println!("Minimum confidence: {}", config.thresholds.min_confidence);
        println!("Minimum lift: {}", config.thresholds.min_lift);
        if let Some(dir) = &args.work_dir {
            println!("Work directory: {}", dir.display());
        }
        println!();
    }

    let analysis = run_analysis(
        &args.input,
        &config,
        miner.as_ref(),
        args.work_dir.as_deref(),
    )
    .with_context(|| format!("analysis of {} failed", args.input.display()))?;

    // nothing is shown unless the report was written
    report::write_report_csv(&analysis.rows, &args.output)
        .with_context(|| format!("cannot write report to {}", args.output.display()))?;

    print_summary(&analysis, args.verbose);

    // Rule table
    println!("\n=== Hasil Analisis ===");
    if analysis.rows.is_empty() {
        println!("No rules met the confidence and lift thresholds.");
    } else {
        print!("{}", report::format_rule_table(&analysis.rows));
    }

    // Conclusions
    println!("\n=== Kesimpulan ===");
    for conclusion in &analysis.conclusions {
        println!("- {}", conclusion);
    }

    let total_time = start_time.elapsed();
    println!("\n=== Analysis Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    println!("Report saved to: {}", args.output.display());

    Ok(())
}

fn print_summary(analysis: &AnalysisReport, verbose: bool) {
    println!("✓ Records loaded: {}", analysis.record_count);
    println!("✓ Transactions (days): {}", analysis.total_transactions);
    println!("✓ Frequent patterns: {}", analysis.patterns.len());
    println!("✓ Rules accepted: {}", analysis.rules.len());

    if verbose {
        println!("\nFrequent patterns:");
        for pattern in &analysis.patterns {
            println!("  {}", pattern);
        }
    }
}
