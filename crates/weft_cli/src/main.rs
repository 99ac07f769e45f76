//! Weft CLI: the command-line front end of the Weft elaborator.
//!
//! Provides `weft check` to assemble and elaborate an application,
//! `weft build` to write the artifact and symbol table, and `weft symtab` to
//! print the address map.

#![warn(missing_docs)]

mod build;
mod check;
mod pipeline;
mod symtab;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Weft: dataflow composition and address-map elaboration for FPGA designs.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Weft elaborator")]
pub struct Cli {
    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug events from the elaborator.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `weft.toml` file or the directory holding one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble and elaborate the application without writing output.
    Check,
    /// Elaborate and write the artifact and symbol table.
    Build(BuildArgs),
    /// Print the address map.
    Symtab(SymtabArgs),
}

/// Arguments for the `weft build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Output directory (default: `build/` next to `weft.toml`).
    #[arg(short, long)]
    pub out_dir: Option<String>,
}

/// Arguments for the `weft symtab` subcommand.
#[derive(Parser, Debug)]
pub struct SymtabArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = SymtabFormat::Text)]
    pub format: SymtabFormat,
}

/// Symbol table output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SymtabFormat {
    /// Tab-separated lines.
    Text,
    /// JSON array.
    Json,
}

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    /// `--quiet` was given.
    pub quiet: bool,
    /// Whether to print debug information.
    pub verbose: bool,
    /// Optional path to a configuration file or directory.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Default log level when `RUST_LOG` sets none.
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::ERROR
        } else if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(global.log_level().into()))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Check => check::run(&global),
        Command::Build(ref args) => build::run(args, &global),
        Command::Symtab(ref args) => symtab::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
