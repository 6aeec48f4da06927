//! Policyctl CLI - Policyfile checker and exporter.
//!
//! Commands:
//! - `policyctl check` - Parse and validate a Policyfile
//! - `policyctl export` - Export a Policyfile to YAML or JSON
//! - `policyctl verify` - Check a Policyfile against its lockfile
//! - `policyctl attr` - Print one attribute value
//! - `policyctl run-list` - Print one run list
//! - `policyctl explain` - Generate a Markdown report

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "policyctl")]
#[command(about = "Parse, validate and export Chef Policyfiles")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a Policyfile
    Check {
        /// Path to the Policyfile
        #[arg(short, long, env = "POLICYFILE", default_value = "Policyfile.rb")]
        policy: String,
    },

    /// Export a Policyfile for the resolution engine
    Export {
        /// Path to the Policyfile
        #[arg(short, long, env = "POLICYFILE", default_value = "Policyfile.rb")]
        policy: String,

        /// Output path ("-" for stdout)
        #[arg(short, long, default_value = "Policyfile.export.yaml")]
        output: String,

        /// Output format (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Write a lockfile next to the Policyfile
        #[arg(long)]
        lock: bool,
    },

    /// Verify a Policyfile against its lockfile
    Verify {
        /// Path to the Policyfile
        #[arg(short, long, env = "POLICYFILE", default_value = "Policyfile.rb")]
        policy: String,

        /// Path to the lockfile (defaults to <policy>.lock.json)
        #[arg(short, long)]
        lock: Option<String>,

        /// Output format the lock was created with (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Print the value of an attribute as JSON
    Attr {
        /// Dotted attribute path, e.g. mcs.org.name
        path: String,

        /// Path to the Policyfile
        #[arg(short, long, env = "POLICYFILE", default_value = "Policyfile.rb")]
        policy: String,

        /// Look in override attributes instead of default attributes
        #[arg(long = "override")]
        override_scope: bool,
    },

    /// Print the recipes of a run list
    RunList {
        /// Run-list name
        #[arg(default_value = "default")]
        name: String,

        /// Path to the Policyfile
        #[arg(short, long, env = "POLICYFILE", default_value = "Policyfile.rb")]
        policy: String,
    },

    /// Generate a Markdown report explaining the policy
    Explain {
        /// Path to the Policyfile
        #[arg(short, long, env = "POLICYFILE", default_value = "Policyfile.rb")]
        policy: String,

        /// Output path for the report
        #[arg(short, long, default_value = "POLICY.md")]
        output: String,
    },

    /// Print the JSON Schema of the export format
    Schema,

    /// Create a starter Policyfile
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: String,

        /// Policy name
        #[arg(short, long, default_value = "default")]
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { policy } => commands::check::run(&policy),
        Commands::Export {
            policy,
            output,
            format,
            lock,
        } => commands::export::run(&policy, &output, &format, lock),
        Commands::Verify {
            policy,
            lock,
            format,
        } => commands::verify::run(&policy, lock.as_deref(), &format),
        Commands::Attr {
            path,
            policy,
            override_scope,
        } => commands::attr::run(&policy, &path, override_scope),
        Commands::RunList { name, policy } => commands::run_list::run(&policy, &name),
        Commands::Explain { policy, output } => commands::explain::run(&policy, &output),
        Commands::Schema => commands::schema::run(),
        Commands::Init { path, name } => commands::init::run(&path, &name),
    }
}
