use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use litecss::config::SiteConfig;
use litecss::Manager;

#[derive(Parser)]
#[command(name = "litecss", version = "0.2.0")]
#[command(about = "litecss — custom stylesheet addon for static site builds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report discovered custom.css sources
    Status {
        /// Site input root
        #[arg(long, default_value = ".")]
        lite_dir: PathBuf,

        /// Output root (default: <lite-dir>/_output)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// App to consider (repeatable; overrides config file)
        #[arg(long = "app")]
        apps: Vec<String>,

        /// Explicit config file (default: <lite-dir>/litecss.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Copy/merge custom.css into the output tree and inject link tags
    Build {
        /// Site input root
        #[arg(long, default_value = ".")]
        lite_dir: PathBuf,

        /// Output root (default: <lite-dir>/_output)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// App to consider (repeatable; overrides config file)
        #[arg(long = "app")]
        apps: Vec<String>,

        /// Explicit config file (default: <lite-dir>/litecss.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after copy/merge, without touching index documents
        #[arg(long)]
        skip_inject: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Status {
            lite_dir,
            output_dir,
            apps,
            config,
        } => {
            let manager = resolve_manager(lite_dir, output_dir, apps, config);
            match litecss::run_status(&manager) {
                Ok(found) => {
                    eprintln!("{found} custom.css source(s) found");
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }

        Commands::Build {
            lite_dir,
            output_dir,
            apps,
            config,
            skip_inject,
        } => {
            let manager = resolve_manager(lite_dir, output_dir, apps, config);
            let result = if skip_inject {
                litecss::run_build(&manager)
            } else {
                litecss::run_full_build(&manager)
            };
            match result {
                Ok(executed) => {
                    eprintln!("ran {executed} unit(s), output in {}", manager.output_dir.display());
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

fn resolve_manager(
    lite_dir: PathBuf,
    output_dir: Option<PathBuf>,
    apps: Vec<String>,
    config: Option<PathBuf>,
) -> Manager {
    let loaded = match config {
        Some(path) => SiteConfig::load(&path),
        None => SiteConfig::load_dir(&lite_dir),
    };
    let site_config = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    site_config.into_manager(lite_dir, output_dir, apps)
}
