//! annogen CLI: generates binding glue and interface stubs from annotated
//! C headers.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "annogen",
    version,
    about = "Annotation-driven binding and stub generator"
)]
struct Cli {
    /// Log skip decisions and dependency listings
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task in annogen.toml
    Generate {
        /// Clear all stamps first so every task regenerates
        #[arg(long)]
        reload: bool,
        /// Manifest to use instead of searching for annogen.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Remove all stamps
    Clean {
        /// Manifest to use instead of searching for annogen.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the declarations a header exposes
    Inspect {
        /// C header to parse
        header: PathBuf,
        /// Include declarations without the binding tag and hidden members
        #[arg(long)]
        all: bool,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Generate { reload, config } => {
            let (manifest, base_dir) = manifest::resolve(&cwd, config.as_deref())?;
            commands::generate::run(&manifest, &base_dir, reload).map(|_| ())
        }
        Commands::Clean { config } => {
            let (manifest, base_dir) = manifest::resolve(&cwd, config.as_deref())?;
            commands::clean::run(&manifest, &base_dir)
        }
        Commands::Inspect {
            header,
            all,
            format,
        } => commands::inspect::run(&cwd.join(header), all, format.as_deref()),
    }
}
