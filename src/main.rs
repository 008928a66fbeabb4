// Copyright 2025 bakri (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CLI entry point for texpand
//!
//! Runs the expansion daemon (the default) and provides commands for
//! initialising, migrating, checking and listing the configuration.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::*;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::path::{Path, PathBuf};

use texpand::config::{
    default_config_dir, expand_path, init_config, load_rule_set, migrate_config, validate_rule_set,
    InitOutcome,
};
use texpand::core::Conflict;
use texpand::daemon::{self, DaemonOptions};

#[derive(Parser)]
#[command(name = "texpand")]
#[command(author, version, about = "Text expansion daemon for Linux", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration directory [default: ~/.config/texpand]
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the expansion daemon (default)
    Run,

    /// Write the default configuration (existing files are kept)
    Init,

    /// Upgrade the configuration to the current schema
    Migrate,

    /// Load the configuration and report conflicts
    Check,

    /// List all triggers in match order
    List,

    /// Print the version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config_dir = match &cli.config {
        Some(dir) => expand_path(dir),
        None => default_config_dir()?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(config_dir)?,
        Commands::Init => init(&config_dir)?,
        Commands::Migrate => migrate(&config_dir)?,
        Commands::Check => check(&config_dir)?,
        Commands::List => list(&config_dir)?,
        Commands::Version => println!("texpand {}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}

/// Info by default, debug for this crate with `--debug`, RUST_LOG on top.
fn init_logging(debug: bool) {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info);
    if debug {
        builder.filter_module("texpand", LevelFilter::Debug);
    }
    builder
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn run_daemon(config_dir: PathBuf) -> anyhow::Result<()> {
    println!(
        "{} texpand {} using {}",
        "→".cyan(),
        env!("CARGO_PKG_VERSION"),
        config_dir.display()
    );

    daemon::run(DaemonOptions::new(config_dir)).context("texpand could not start")?;
    Ok(())
}

fn init(config_dir: &Path) -> anyhow::Result<()> {
    println!("{} Initializing config in {}", "→".cyan(), config_dir.display());

    for outcome in init_config(config_dir)? {
        match outcome {
            InitOutcome::Created(path) => println!("  {} created {}", "✓".green(), path.display()),
            InitOutcome::Skipped(path) => {
                println!("  {} skip {} (already exists)", "-".dimmed(), path.display())
            }
        }
    }

    println!("{} Config initialized", "✓".green().bold());
    Ok(())
}

fn migrate(config_dir: &Path) -> anyhow::Result<()> {
    let report = migrate_config(config_dir)
        .with_context(|| format!("Migration of {} failed", config_dir.display()))?;

    if report.is_up_to_date() {
        println!("{} Config already up to date", "✓".green());
        return Ok(());
    }

    for name in &report.applied {
        println!("  {} ran migration {}", "→".cyan(), name);
    }
    for path in &report.migrated_files {
        println!("  {} migrated {}", "✓".green(), path.display());
    }
    println!(
        "{} Migration complete (version {} → {})",
        "✓".green().bold(),
        report.from_version,
        report.to_version
    );
    Ok(())
}

/// Checks the configuration, exiting with status 1 on conflicts
fn check(config_dir: &Path) -> anyhow::Result<()> {
    println!("{} Loading config: {}", "→".cyan(), config_dir.display());

    let rules = load_rule_set(config_dir).context("Failed to load configuration")?;
    println!(
        "{} Found {} rules (trigger mode: {})\n",
        "✓".green(),
        rules.len(),
        rules.trigger_mode()
    );

    let report = validate_rule_set(&rules);

    for issue in &report.issues {
        println!("{} {}", "⚠".yellow(), issue);
    }
    if !report.issues.is_empty() {
        println!();
    }

    if !report.has_conflicts() {
        println!("{} {}", "✓".green().bold(), "No conflicts detected!".bold());
        return Ok(());
    }

    println!(
        "{} Found {} conflict{}:\n",
        "✗".red().bold(),
        report.conflicts.len(),
        if report.conflicts.len() == 1 { "" } else { "s" }
    );

    for (i, conflict) in report.conflicts.iter().enumerate() {
        let header = format!("Conflict {}", i + 1).yellow().bold();
        match conflict {
            Conflict::Duplicate { trigger, replacements } => {
                println!("{} {} declared {} times", header, trigger.cyan(), replacements.len());
                for (idx, replacement) in replacements.iter().enumerate() {
                    println!("  {} → {}", format!("{}.", idx + 1).dimmed(), replacement);
                }
            }
            Conflict::Shadowed { trigger, shadowed_by } => {
                println!(
                    "{} {} never fires: {} fires first while typing it",
                    header,
                    trigger.cyan(),
                    shadowed_by.magenta()
                );
            }
        }
        println!();
    }

    println!("{}", "⚠ These triggers will not expand as written!".yellow());
    std::process::exit(1);
}

/// Lists every trigger in match order
fn list(config_dir: &Path) -> anyhow::Result<()> {
    let rules = load_rule_set(config_dir).context("Failed to load configuration")?;

    println!("{}", format!("Triggers from: {}\n", config_dir.display()).bold());

    for rule in rules.rules() {
        println!("{} → {}", rule.trigger().cyan().bold(), rule.replacement().replace('\n', "⏎"));
    }

    println!("\n{} Total: {} rules", "✓".green(), rules.len());
    Ok(())
}
