pub mod check;
pub mod index;
pub mod render;

use crate::config::SmartlinksConfig;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use smartlinks_core::Smartlinks;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smartlinks")]
#[command(version, about = "Wiki-style [[ smartlinks ]] resolved through a search index")]
pub struct Cli {
    /// Path to smartlinks.toml
    #[arg(
        long,
        global = true,
        env = "SMARTLINKS_CONFIG",
        default_value = "smartlinks.toml"
    )]
    pub config: PathBuf,

    /// Path to the index file (overrides config file)
    #[arg(long, global = true, env = "SMARTLINKS_INDEX")]
    pub index: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wipe the search index and rebuild it from every configured type
    ResetIndex,
    /// Replace the smartlinks and embeds of a file (or stdin)
    Render(RenderArgs),
    /// Show what a single smartlink resolves to
    Resolve(ResolveArgs),
    /// Index statistics
    Stats,
    /// Validate the configuration and registrations
    Check,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// File to render; reads stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The smartlink, e.g. "[[ m->Mad Max ]]"
    pub link: String,
}

impl Cli {
    pub fn load_config(&self) -> Result<SmartlinksConfig> {
        let mut config = SmartlinksConfig::load(&self.config)?;
        if let Some(index) = &self.index {
            config.index_path = index.clone();
        }
        Ok(config)
    }
}

/// Build the registry and open the index named by `config`.
pub fn open(config: &SmartlinksConfig) -> Result<Smartlinks> {
    let registry = config.build_registry()?;
    let path = config.index_path();
    Smartlinks::open(&path, registry)
        .with_context(|| format!("Failed to open index at {}", path.display()))
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;

    match cli.command {
        Commands::ResetIndex => index::reset(&config),
        Commands::Render(args) => render::run(&config, args.file.as_deref()),
        Commands::Resolve(args) => render::resolve(&config, &args.link),
        Commands::Stats => index::stats(&config),
        Commands::Check => check::run(&config),
    }
}
