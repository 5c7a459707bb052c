// src/config.rs
use crate::error::ConfigError;
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONFIG_FILE: &str = "marklive.toml";
const PROFILE: &str = "marklive";

/// Command-line arguments for the application.
#[derive(Parser, Debug, Deserialize, Default)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Serve a live preview of a single file instead of converting
    #[clap(
        short,
        long,
        help = "Serve a live preview of a single file instead of converting"
    )]
    pub preview: bool,

    /// Address the preview server binds to (default: all interfaces)
    #[clap(
        short,
        long,
        value_parser,
        help = "Address the preview server binds to (default: all interfaces)"
    )]
    pub addr: Option<String>,

    /// Port the preview server listens on (default: 8080)
    #[clap(
        long,
        value_parser,
        help = "Port the preview server listens on (default: 8080)"
    )]
    pub port: Option<u16>,

    /// Path to a configuration file (e.g., marklive.toml)
    #[clap(
        short,
        long,
        value_parser,
        help = "Path to a configuration file (e.g., marklive.toml)"
    )]
    pub config: Option<PathBuf>,

    /// Markdown files to convert, or the single file to preview
    #[clap(help = "Markdown files to convert, or the single file to preview")]
    pub paths: Vec<String>,

    /// Log level (e.g., trace, debug, info, warn, error)
    #[clap(
        long,
        value_parser,
        help = "Log level (e.g., trace, debug, info, warn, error)"
    )]
    pub log_level: Option<String>,
}

/// Configuration loaded from file, environment, or defaults.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct FileConfig {
    /// Files to convert or preview
    pub paths: Option<Vec<String>>,
    /// Bind address
    pub addr: Option<String>,
    /// Listen port
    pub port: Option<u16>,
    /// Preview mode
    pub preview: Option<bool>,
    /// Log level
    pub log_level: Option<String>,
}

/// Final application configuration after merging all sources.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Whether to run the live preview server
    pub preview: bool,
    /// Bind address for the preview server
    pub addr: String,
    /// Listen port for the preview server
    pub port: u16,
    /// Files to convert, or the one file to preview
    pub paths: Vec<String>,
    /// Log level
    pub log_level: String,
}

impl AppConfig {
    /// Loads the configuration from the process arguments, file, and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Merges defaults, the TOML file, `MARKLIVE_*` environment variables and `cli_args`, in
    /// increasing order of precedence, then validates the result.
    pub fn from_cli(cli_args: CliArgs) -> Result<Self, ConfigError> {
        let config_file_path = cli_args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let default_log_level =
            std::env::var("MARKLIVE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let fig = Figment::new()
            .merge(Serialized::defaults(FileConfig {
                addr: Some(DEFAULT_ADDR.to_string()),
                port: Some(DEFAULT_PORT),
                preview: Some(false),
                log_level: Some(default_log_level),
                paths: Some(vec![]),
            }))
            .merge(Toml::file(config_file_path).nested())
            .merge(
                // Same profile as the file's `[marklive]` table, so the environment wins over it.
                Env::prefixed("MARKLIVE_")
                    .map(|key| key.as_str().replace("__", ".").into())
                    .profile(PROFILE),
            );

        let merged_config: FileConfig = fig.select(PROFILE).extract()?;
        Self::resolve(cli_args, merged_config)
    }

    /// Applies CLI overrides on top of an already merged `FileConfig`.
    pub fn resolve(cli_args: CliArgs, merged_config: FileConfig) -> Result<Self, ConfigError> {
        let paths = if !cli_args.paths.is_empty() {
            cli_args.paths
        } else {
            merged_config.paths.unwrap_or_default()
        };

        let config = AppConfig {
            // CLI presence means true
            preview: cli_args.preview || merged_config.preview.unwrap_or(false),
            addr: cli_args
                .addr
                .or(merged_config.addr)
                .unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            port: cli_args.port.or(merged_config.port).unwrap_or(DEFAULT_PORT),
            paths,
            log_level: cli_args
                .log_level
                .or(merged_config.log_level)
                .unwrap_or_else(|| "info".to_string()),
        };

        if config.preview && config.paths.len() != 1 {
            return Err(ConfigError::PreviewPathCount(config.paths.len()));
        }
        Ok(config)
    }

    /// The host and port the preview server binds to.
    pub fn listen_addr(&self) -> (String, u16) {
        let host = if self.addr.is_empty() {
            DEFAULT_ADDR.to_string()
        } else {
            self.addr.clone()
        };
        (host, self.port)
    }
}
