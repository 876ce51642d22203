// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptor inspector
//!
//! Loads a facts table and an optional registry configuration, then prints
//! the descriptors the registry resolves.
//!
//! # Usage
//!
//! ```bash
//! # Describe a few types
//! typemeta-inspect describe --facts types.json Point "Map<String,List<Point>>"
//!
//! # With a registry configuration and a marshalling format
//! typemeta-inspect describe --facts types.yaml --config typemeta.toml --format text/plain Money
//!
//! # List the types a facts file declares
//! typemeta-inspect list --facts types.json
//!
//! # Write a starter configuration
//! typemeta-inspect gen-config --output typemeta.toml
//! ```

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use render::Summary;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use typemeta::{
    classify, Error, FactsTable, MarshalContext, RegistryConfig, TypeFactsProvider, TypeRegistry,
};

/// Type descriptor inspector
#[derive(Parser, Debug)]
#[command(name = "typemeta-inspect")]
#[command(about = "Inspect type descriptors resolved from a facts table")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error); defaults to the
    /// configuration file's `log_level`, then `info`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve type expressions and print their descriptors
    Describe {
        /// Facts file (.json, .yaml or .yml)
        #[arg(short, long)]
        facts: PathBuf,

        /// Registry configuration file (.toml, .yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Marshalling format used to select transforms
        #[arg(long, default_value = "*/*")]
        format: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Type expressions, e.g. "Map<String,Point>"
        #[arg(required = true)]
        types: Vec<String>,
    },

    /// List the types of a facts file with their category
    List {
        /// Facts file (.json, .yaml or .yml)
        #[arg(short, long)]
        facts: PathBuf,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "typemeta.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = log_level(&args);
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::Describe {
            facts,
            config,
            format,
            json,
            types,
        } => cmd_describe(&facts, config.as_deref(), &format, json, &types),
        Commands::List { facts } => cmd_list(&facts),
        Commands::GenConfig { output } => cmd_gen_config(&output),
    }
}

/// Command-line level, else the level of the configuration being loaded.
fn log_level(args: &Args) -> String {
    if let Some(level) = &args.log_level {
        return level.clone();
    }
    match &args.command {
        Commands::Describe {
            config: Some(path), ..
        } => RegistryConfig::from_file(path)
            .map(|c| c.log_level)
            .unwrap_or_else(|_| "info".to_string()),
        _ => "info".to_string(),
    }
}

fn load_facts(path: &Path) -> Result<FactsTable> {
    let mut table = FactsTable::with_core_types();
    let count = table
        .load_file(path)
        .with_context(|| format!("Failed to load facts from {}", path.display()))?;
    tracing::info!("Loaded {} type(s) from {}", count, path.display());
    Ok(table)
}

fn build_registry(facts: &Path, config: Option<&Path>) -> Result<TypeRegistry> {
    let table = load_facts(facts)?;
    let config = match config {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    TypeRegistry::builder(table)
        .config(config)
        .build()
        .context("Invalid registry configuration")
}

fn cmd_describe(
    facts: &Path,
    config: Option<&Path>,
    format: &str,
    json: bool,
    types: &[String],
) -> Result<()> {
    let registry = build_registry(facts, config)?;
    let ctx = MarshalContext::new(format);

    let mut summaries = Vec::with_capacity(types.len());
    for text in types {
        let desc = match registry.lookup(text) {
            Ok(desc) => desc,
            Err(e @ Error::Initialization { .. }) => {
                tracing::warn!("{}", e);
                // The failed descriptor stays cached; show it anyway.
                registry
                    .lookup(text)
                    .with_context(|| format!("Cannot describe '{text}'"))?
            }
            Err(e) => return Err(e).with_context(|| format!("Cannot describe '{text}'")),
        };
        summaries.push(Summary::of(&desc, &ctx));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            print!("{}", summary.to_text());
        }
    }

    let stats = registry.stats();
    tracing::debug!(
        "Registry: {} cached, {} built, {} failed",
        registry.len(),
        stats.builds,
        stats.failures
    );
    Ok(())
}

fn cmd_list(facts: &Path) -> Result<()> {
    let table = load_facts(facts)?;
    for name in table.names() {
        let facts = table.facts(&name)?;
        println!("{:<32} {}", name, classify(&facts));
    }
    Ok(())
}

fn cmd_gen_config(output: &Path) -> Result<()> {
    let example = RegistryConfig::default()
        .implementation("List", "ArrayList")
        .implementation("Map", "HashMap")
        .not_bean("Thread");
    let body = example.to_toml_string()?;
    let content = format!("# typemeta registry configuration\n\n{body}");
    std::fs::write(output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Generated config: {}", output.display());
    Ok(())
}
