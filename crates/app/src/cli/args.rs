pub use clap::Parser;

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "sealpoint")]
#[command(about = "Encrypt a file, publish it by content address and register it under your key")]
pub struct Args {
    /// Path to the sealpoint config directory (defaults to ~/.sealpoint)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level written to stderr; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: crate::Command,
}
