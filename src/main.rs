//! Shiori command-line interface
//!
//! The frontier itself is a library embedded by a crawler; this binary
//! covers the operational chores around it: validating a configuration,
//! auditing a recovery journal, and previewing what a journal recovery
//! would re-schedule.

use anyhow::Context;
use clap::Parser;
use shiori::config::load_config_with_hash;
use shiori::journal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shiori: a crash-recoverable, polite URI frontier
#[derive(Parser, Debug)]
#[command(name = "shiori")]
#[command(version = "1.0.0")]
#[command(about = "URI frontier configuration and journal tooling", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and print the effective settings
    #[arg(long, conflicts_with_all = ["audit", "recover"])]
    dry_run: bool,

    /// Count journal records per event type and exit
    #[arg(long, value_name = "JOURNAL", conflicts_with = "recover")]
    audit: Option<PathBuf>,

    /// Show what replaying a journal would re-schedule, then exit
    #[arg(long, value_name = "JOURNAL", conflicts_with = "audit")]
    recover: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(journal_path) = &cli.audit {
        handle_audit(journal_path)
    } else if let Some(journal_path) = &cli.recover {
        handle_recover(journal_path)
    } else if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        Ok(())
    } else {
        println!("\u{2713} Configuration is valid (hash: {})", config_hash);
        Ok(())
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shiori=info,warn"),
            1 => EnvFilter::new("shiori=debug,info"),
            2 => EnvFilter::new("shiori=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: the configuration parsed and validated, so summarize it
fn handle_dry_run(config: &shiori::FrontierConfig, config_hash: &str) {
    println!("=== Shiori Configuration ===\n");

    println!("Politeness:");
    println!("  Delay factor: {}", config.politeness.delay_factor);
    println!("  Delay bounds: {}ms - {}ms", config.politeness.min_delay_ms, config.politeness.max_delay_ms);
    if config.politeness.max_per_host_bandwidth_kb > 0 {
        println!("  Per-host bandwidth cap: {} KB/s", config.politeness.max_per_host_bandwidth_kb);
    } else {
        println!("  Per-host bandwidth cap: none");
    }

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_retries);
    println!("  Retry delay: {}s", config.retry.retry_delay_seconds);

    println!("\nChannels:");
    println!("  Outbound capacity: {}", config.channels.outbound_capacity);
    println!("  Inbound capacity: {}", config.channels.inbound_capacity());

    println!("\nJournal:");
    if config.journal.enabled {
        println!("  Path: {}", config.journal.path);
    } else {
        println!("  Disabled");
    }

    println!("\nQueues:");
    println!("  Base precedence: {}", config.queues.base_precedence);
    if let Some(key) = &config.queues.force_class_key {
        println!("  Forced class key: {}", key);
    }
    for over in &config.queues.precedence_overrides {
        println!("  Override: {} -> {}", over.authority, over.precedence);
    }

    println!("\n\u{2713} Configuration is valid (hash: {})", config_hash);
}

/// Handles --audit: per-event-type record counts from an existing journal
fn handle_audit(journal_path: &PathBuf) -> anyhow::Result<()> {
    let stats = journal::audit(journal_path)
        .with_context(|| format!("failed to audit {}", journal_path.display()))?;

    println!("=== Journal Audit: {} ===\n", journal_path.display());
    println!("{}", stats);
    println!(
        "\n{} total records, {} terminal, {} still pending",
        stats.total_records(),
        stats.terminal(),
        stats.added + stats.rescheduled
    );
    Ok(())
}

/// Handles --recover: previews the pending URIs a replay would re-schedule
fn handle_recover(journal_path: &PathBuf) -> anyhow::Result<()> {
    let pending = journal::replay(journal_path)
        .with_context(|| format!("failed to replay {}", journal_path.display()))?;

    println!("=== Recovery Preview: {} ===\n", journal_path.display());
    println!("{} URIs would be re-scheduled:", pending.len());
    for record in pending.iter().take(50) {
        if record.attempts > 0 {
            println!("  {} (ordinal {}, {} attempts)", record.uri, record.ordinal, record.attempts);
        } else {
            println!("  {} (ordinal {})", record.uri, record.ordinal);
        }
    }
    if pending.len() > 50 {
        println!("  ... and {} more", pending.len() - 50);
    }
    Ok(())
}
