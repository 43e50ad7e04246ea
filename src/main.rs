use clap::Parser;
use tracing::{error, warn, Level};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod core;
mod error;

use cli::Cli;
use config::Config;
use crate::core::{Engine, Options};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = log_level_from_arg(&cli.log_level);
    let env_directives = std::env::var("RUST_LOG").unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, &env_directives))
        .with_writer(std::io::stderr)
        .init();

    if level.is_none() {
        warn!("Unable to parse log level, defaulting to 'info'");
    }

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_or_default(cli.config.as_deref())?;

    let options = Options {
        base_dir: cli.dir,
        search_packages: cli.packages,
        package_name: cli.package_name,
        output_dir: cli.output_dir,
        client_default: cli.default_panic,
    };

    let mut engine = Engine::new(options, config)?;
    engine.run().await?;
    Ok(())
}

fn log_level_from_arg(arg: &str) -> Option<Level> {
    match arg.to_lowercase().as_str() {
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// The requested level is the default directive; RUST_LOG directives
/// refine it per target when present.
fn log_filter(level: Option<Level>, env_directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.unwrap_or(Level::INFO).into())
        .parse_lossy(env_directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_levels_parse_case_insensitively() {
        assert_eq!(log_level_from_arg("DEBUG"), Some(Level::DEBUG));
        assert_eq!(log_level_from_arg("warn"), Some(Level::WARN));
        assert_eq!(log_level_from_arg("verbose"), None);
    }

    #[test]
    fn requested_level_becomes_the_default_directive() {
        assert_eq!(log_filter(Some(Level::DEBUG), "").to_string(), "debug");
        assert_eq!(log_filter(None, "").to_string(), "info");
    }

    #[test]
    fn env_directives_take_precedence() {
        assert_eq!(log_filter(Some(Level::INFO), "warn").to_string(), "warn");
    }
}
