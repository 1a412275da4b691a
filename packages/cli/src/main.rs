mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{convert, get, remove, schema, set, ConvertArgs, GetArgs, RemoveArgs, SchemaArgs, SetArgs};
use tracing_subscriber::EnvFilter;

/// Metaconf CLI - schema-aware editing of JSON and YAML documents
#[derive(Parser, Debug)]
#[command(name = "metaconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace); overrides RUST_LOG
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value at a path
    Get(GetArgs),

    /// Set the value at a path, placing new keys in schema order
    Set(SetArgs),

    /// Remove the value at a path
    Remove(RemoveArgs),

    /// Show the effective schema for a data path
    Schema(SchemaArgs),

    /// Convert a document between JSON and YAML
    Convert(ConvertArgs),
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(e) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Get(args) => get(args, &cwd),
        Command::Set(args) => set(args, &cwd),
        Command::Remove(args) => remove(args, &cwd),
        Command::Schema(args) => schema(args, &cwd),
        Command::Convert(args) => convert(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
