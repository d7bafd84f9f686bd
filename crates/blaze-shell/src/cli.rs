use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "blaze-shell")]
#[command(about = "Load Blaze restaurant pages through the SPA hash router")]
pub struct Cli {
    /// Site directory holding index.html and pages/ (default: ./site)
    #[arg(long, conflicts_with = "base_url")]
    pub site: Option<PathBuf>,

    /// Fetch the site over HTTP from this base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Router configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file keeping the last valid route between runs
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Override the fragment fetch timeout
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Precache the site and serve fetches through the offline cache
    #[arg(long)]
    pub offline_cache: bool,

    /// Print one JSON object per navigation
    #[arg(long)]
    pub json: bool,

    /// Hashes to visit in order, e.g. `#menu chinese`
    pub hashes: Vec<String>,
}
