//! energy-dash: terminal charts for the energy anomaly detection service.
//!
//! Renders the dashboard overview, single detection results, the model
//! comparison and algorithm illustrations with ratatui.

mod app;
mod cli;
mod data;
mod logging;
mod pages;
mod registry;
mod render;
mod ui;

use anyhow::Result;
use cli::{AppConfig, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Show(args) => {
            let config = AppConfig::from_show_command(args)?;

            // Logging is optional; the dashboard still runs without it
            let _guard = match logging::init(&config.data_dir, config.log_level.as_deref()) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    eprintln!("energy-dash: logging disabled: {e:#}");
                    None
                }
            };

            app::run(config)?;
        }
    }

    Ok(())
}
