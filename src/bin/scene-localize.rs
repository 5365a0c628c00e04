//! Command-line front end for the scene localizer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scene_localizer::selection::DEFAULT_SELECTION_FILE;
use scene_localizer::{
    DependencyInfo, DependencyProcessor, DependencySelection, LocalizeConfig, OwningDocument,
    StripPrefix, localize_with_config,
};
use tracing_subscriber::EnvFilter;

/// Copy a scene document and all of its dependencies into a self-contained directory.
#[derive(Debug, Parser)]
#[command(name = "scene-localize", version, about)]
struct Cli {
    /// Root document to localize.
    root: PathBuf,

    /// Destination directory; must be absent or empty.
    dest: PathBuf,

    /// Settings file (defaults to localize.config.json next to the root document).
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with `include` and `exclude` asset-path scopes.
    #[arg(long)]
    selection: Option<PathBuf>,

    /// Remove this prefix from the file name of every dependency.
    #[arg(long, value_name = "PREFIX")]
    strip_prefix: Option<String>,

    /// Enable debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root_dir = cli
        .root
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let config = match &cli.config {
        Some(path) => LocalizeConfig::from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => LocalizeConfig::discover(&root_dir),
    };

    let selection_path = cli
        .selection
        .clone()
        .unwrap_or_else(|| root_dir.join(DEFAULT_SELECTION_FILE));
    let mut selection = DependencySelection::load_from_path(&selection_path)?;
    let mut strip = cli.strip_prefix.as_deref().map(StripPrefix::new);
    let active = !selection.is_unfiltered() || strip.is_some();

    let mut chain = |owner: &OwningDocument, info: DependencyInfo| -> Result<DependencyInfo> {
        let info = selection.process(owner, info)?;
        match strip.as_mut() {
            Some(strip) if !info.is_removed() => strip.process(owner, info),
            _ => Ok(info),
        }
    };
    let processor: Option<&mut dyn DependencyProcessor> = if active {
        Some(&mut chain)
    } else {
        None
    };

    let summary = localize_with_config(&cli.root, &cli.dest, &config, processor)
        .with_context(|| format!("failed to localize {}", cli.root.display()))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
