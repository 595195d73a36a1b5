mod app;
mod config;
mod input;
mod speech;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use app::App;
use config::{AppConfig, Cli};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;

    let app = App::new(config)?;
    app.run()?;

    Ok(())
}
