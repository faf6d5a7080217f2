// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! omelette - boot and inspect a component bundle
//!
//! This is the main entry point for the omelette CLI/REPL.

mod repl;

use clap::{Parser, Subcommand};
use omelette_loader::{Bundle, Exports, VERSION};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "omelette",
    about = "Boot and inspect an omelette component bundle",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Bundle manifest; without it, omelette.toml is used when present
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Require the entry module (default)
    Boot,

    /// Require a module and print its exports
    Require {
        /// Module name or alias
        name: String,
    },

    /// Resolve the highest version of an `owner~repo` package
    Latest {
        /// Scoped package name
        name: String,

        /// Print the registry key instead of the exports
        #[arg(long)]
        path: bool,
    },

    /// List registered module keys
    #[command(alias = "ls")]
    Modules,

    /// Start an interactive session
    #[command(alias = "i")]
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose {
        "omelette=debug,omelette_loader=debug"
    } else {
        "omelette=warn,omelette_loader=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Command::Boot);

    match run(command, cli.manifest.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, manifest: Option<&Path>) -> anyhow::Result<()> {
    if let Command::Repl = command {
        let mut repl = repl::Repl::new(manifest)?;
        repl.run()?;
        return Ok(());
    }

    debug!(manifest = ?manifest, "loading bundle");
    let bundle = Bundle::open(manifest)?;
    let loader = bundle.loader();

    match command {
        Command::Require { name } => print_exports(&loader.require(&name)?)?,
        Command::Latest { name, path: true } => println!("{}", loader.latest_path(&name)?),
        Command::Latest { name, path: false } => print_exports(&loader.latest(&name)?)?,
        Command::Modules => {
            for key in loader.modules() {
                let loaded = loader.record(&key).is_some_and(|r| r.is_resolved());
                if loaded {
                    println!("{} {}", "●".green(), key);
                } else {
                    println!("{} {}", "○".dimmed(), key);
                }
            }
        }
        Command::Boot | Command::Repl => {
            let exports = bundle.boot()?;
            println!(
                "{} {} {}",
                "booted".green().bold(),
                bundle.entry().cyan(),
                exports.borrow()
            );
        }
    }

    Ok(())
}

fn print_exports(exports: &Exports) -> anyhow::Result<()> {
    let json = exports.borrow().to_json();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
