//! miaka - CRDs and values.schema.json from a Helm chart's values.yaml

use clap::{Parser, Subcommand};
use miaka_crd::CompatibilityPolicy;
use std::path::PathBuf;

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;
mod logging;

use commands::generate::GenerateArgs;
use commands::init::InitArgs;
use commands::inspect::OutputFormat;
use error::Result;

#[derive(Parser)]
#[command(name = "miaka")]
#[command(author = "miaka contributors")]
#[command(version)]
#[command(about = "Generate CRDs and values.schema.json from a Helm chart's values.yaml", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the CRD and JSON Schema for a chart
    Generate(GenerateArgs),

    /// Show the schema inferred from a values file
    Inspect {
        /// Values file
        values: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Validate a values file against a JSON Schema or CRD
    Validate {
        /// Values file to check
        instance: PathBuf,

        /// JSON Schema or CRD file
        #[arg(short, long)]
        schema: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two CRDs and classify the changes
    Diff {
        /// Previous CRD
        old: PathBuf,

        /// New CRD
        new: PathBuf,

        /// Compatibility policy (safe, strict, force)
        #[arg(long, default_value_t = CompatibilityPolicy::Safe)]
        policy: CompatibilityPolicy,
    },

    /// Add apiVersion and kind to a chart's values.yaml
    Init(InitArgs),
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Generate(args) => commands::generate::run(&args),
        Commands::Inspect { values, output } => commands::inspect::run(&values, output),
        Commands::Validate {
            instance,
            schema,
            json,
        } => commands::validate::run(&instance, &schema, json),
        Commands::Diff { old, new, policy } => commands::diff::run(&old, &new, policy),
        Commands::Init(args) => commands::init::run(&args),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    // clap exits with 2 on bad arguments, which is taken by validation failures
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.print().is_err() {
                eprintln!("{err}");
            }
            std::process::exit(if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            });
        }
    };

    if cli.debug {
        // SAFETY: We're the only thread at this point (start of main)
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    logging::init(cli.verbose, cli.debug);

    let code = match run(cli.command) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}
