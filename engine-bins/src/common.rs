//! Shared CLI plumbing for the binaries in this crate.

use anyhow::Result;
use clap::Parser;
use engine_core::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Perpetual-futures execution core")]
pub struct CommonArgs {
    /// Path to the TOML configuration file.
    #[arg(long)]
    pub config: std::path::PathBuf,

    /// Parse and validate the config, then exit without trading.
    #[arg(long)]
    pub check_config: bool,

    /// Run every path except order submission (routed to a no-op adapter).
    #[arg(long)]
    pub dry_run: bool,
}

pub fn load_config(args: &CommonArgs) -> Result<Config> {
    Config::load(&args.config)
}
