use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "aws-mocker")]
#[command(about = "Generates mocks for AWS SDK for Go v2 clients from call-site analysis")]
#[command(version)]
pub struct Cli {
    /// Base directory for the module (required)
    #[arg(long)]
    pub dir: PathBuf,

    /// Comma separated list of packages to search (required)
    #[arg(long)]
    pub packages: String,

    /// Name of the generated package
    #[arg(long = "package-name", default_value = "awsmocked")]
    pub package_name: String,

    /// Output directory for the generated file, if not provided will write to stdout
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Add a panic for Operations that are not mocked
    #[arg(long = "default-panic")]
    pub default_panic: bool,

    /// Set the log level [debug, info, warn, error]
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// Path to a TOML file overriding the service naming table and package filter
    #[arg(long)]
    pub config: Option<PathBuf>,
}
