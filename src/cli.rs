//! Command-line interface argument parsing for energy-dash.
//!
//! - `energy-dash show`
//! - `energy-dash show --page result --result 42`
//! - `energy-dash show --page detection --algorithm kmeans`
//! - `energy-dash show --color-palette "#1abc9c,#e74c3c,#3498db"`

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::data::{Algorithm, Rgba};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
pub const SERVER_ENV: &str = "ENERGY_DASH_SERVER";
pub const DATA_DIR_ENV: &str = "ENERGY_DASH_DIR";
pub const SESSION_ENV: &str = "ENERGY_DASH_SESSION";

/// Terminal charts for the energy anomaly detection service.
#[derive(Parser, Debug)]
#[command(name = "energy-dash")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the chart dashboard
    Show(ShowArgs),
}

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Page to open first
    #[arg(long, value_enum, default_value_t = StartPage::Dashboard)]
    pub page: StartPage,

    /// Result id to load on the result page
    #[arg(short, long)]
    pub result: Option<u64>,

    /// Algorithm illustrated on the detection page
    /// (isolation_forest, autoencoder, kmeans)
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Base URL of the detection service.
    /// Defaults to $ENERGY_DASH_SERVER, then http://127.0.0.1:5000
    #[arg(short, long)]
    pub server: Option<String>,

    /// Session cookie for the result endpoint (defaults to $ENERGY_DASH_SESSION)
    #[arg(long)]
    pub session: Option<String>,

    /// Directory holding overview.json and model_performance.json.
    /// Defaults to $ENERGY_DASH_DIR, then ~/.cache/energy-dash/
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Comma-separated hex color palette for datasets and slices
    /// Example: "#1abc9c,#e74c3c,#3498db"
    #[arg(short, long)]
    pub color_palette: Option<String>,

    /// Log filter, e.g. "debug" or "energy_dash=trace" (overrides RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Seed for the detection page's sample data
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPage {
    #[default]
    Dashboard,
    Result,
    Models,
    Detection,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub start_page: StartPage,
    pub result_id: Option<u64>,
    pub algorithm: Option<Algorithm>,
    pub server_url: String,
    pub session: Option<String>,
    pub data_dir: PathBuf,
    /// Empty means the built-in palette
    pub color_palette: Vec<Rgba>,
    pub log_level: Option<String>,
    pub seed: u64,
}

impl AppConfig {
    /// Create AppConfig from the `show` arguments and the process environment
    pub fn from_show_command(args: ShowArgs) -> Result<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    fn resolve(args: ShowArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let color_palette = match args.color_palette {
            Some(spec) => parse_palette(&spec)?,
            None => Vec::new(),
        };

        let algorithm = match args.algorithm.as_deref() {
            Some(key) => match Algorithm::from_key(key) {
                Some(algorithm) => Some(algorithm),
                None => bail!(
                    "unknown algorithm '{key}', expected one of: {}",
                    Algorithm::ALL.map(Algorithm::key).join(", ")
                ),
            },
            None => None,
        };

        let server_url = args
            .server
            .or_else(|| env(SERVER_ENV))
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());

        let data_dir = args
            .data_dir
            .or_else(|| env(DATA_DIR_ENV))
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".cache")
                    .join("energy-dash")
            });

        Ok(AppConfig {
            start_page: args.page,
            result_id: args.result,
            algorithm,
            server_url,
            session: args.session.or_else(|| env(SESSION_ENV)),
            data_dir,
            color_palette,
            log_level: args.log_level,
            seed: args.seed.unwrap_or_else(rand::random),
        })
    }
}

/// Parse `"#rrggbb,#rrggbb,..."`
fn parse_palette(spec: &str) -> Result<Vec<Rgba>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match Rgba::from_hex(s) {
            Some(color) => Ok(color),
            None => bail!("invalid color '{s}' in --color-palette, expected #rrggbb"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::resolve(ShowArgs::default(), no_env).unwrap();
        assert_eq!(config.start_page, StartPage::Dashboard);
        assert_eq!(config.server_url, DEFAULT_SERVER);
        assert!(config.color_palette.is_empty());
        assert!(config.data_dir.ends_with(".cache/energy-dash"));
        assert!(config.session.is_none());
    }

    #[test]
    fn test_custom_colors() {
        let args = ShowArgs {
            color_palette: Some("#FF0000, #00ff00".to_string()),
            ..ShowArgs::default()
        };
        let config = AppConfig::resolve(args, no_env).unwrap();
        assert_eq!(config.color_palette.len(), 2);
        assert_eq!(config.color_palette[0], Rgba::new(255, 0, 0, 1.0));
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let args = ShowArgs {
            color_palette: Some("#FF0000,red".to_string()),
            ..ShowArgs::default()
        };
        let err = AppConfig::resolve(args, no_env).unwrap_err();
        assert!(err.to_string().contains("'red'"));
    }

    #[test]
    fn test_env_fallbacks_and_flag_precedence() {
        let env = |key: &str| match key {
            SERVER_ENV => Some("http://env:8000".to_string()),
            DATA_DIR_ENV => Some("/tmp/energy".to_string()),
            SESSION_ENV => Some("abc".to_string()),
            _ => None,
        };
        let config = AppConfig::resolve(ShowArgs::default(), env).unwrap();
        assert_eq!(config.server_url, "http://env:8000");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/energy"));
        assert_eq!(config.session.as_deref(), Some("abc"));

        let args = ShowArgs {
            server: Some("http://flag:1".to_string()),
            ..ShowArgs::default()
        };
        assert_eq!(AppConfig::resolve(args, env).unwrap().server_url, "http://flag:1");
    }

    #[test]
    fn test_algorithm_key() {
        let args = ShowArgs {
            algorithm: Some("kmeans".to_string()),
            ..ShowArgs::default()
        };
        assert_eq!(
            AppConfig::resolve(args, no_env).unwrap().algorithm,
            Some(Algorithm::Kmeans)
        );

        let args = ShowArgs {
            algorithm: Some("dbscan".to_string()),
            ..ShowArgs::default()
        };
        assert!(AppConfig::resolve(args, no_env).is_err());
    }

    #[test]
    fn test_parse_show_command() {
        let cli = Cli::try_parse_from([
            "energy-dash", "show", "--page", "result", "--result", "42", "--seed", "7",
        ])
        .unwrap();
        let Commands::Show(args) = cli.command;
        assert_eq!(args.page, StartPage::Result);
        assert_eq!(args.result, Some(42));
        assert_eq!(args.seed, Some(7));
    }
}
