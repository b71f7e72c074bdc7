pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "s3sftp")]
#[command(about = "Jailed, per-user SFTP access to a single object storage bucket")]
pub struct Args {
    /// Path to the config file (defaults to ~/.s3sftp/config.toml)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
