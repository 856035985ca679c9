//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::services::default_settings_path;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "break-reminder")]
#[command(about = "Recurring break reminders with a full-screen overlay and lock-aware auto-reset")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not watch D-Bus for screen lock and sleep signals
    #[arg(long)]
    pub no_screen_monitor: bool,

    /// Do not poll xrandr for connected displays
    #[arg(long)]
    pub no_display_probe: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(default_settings_path)
    }
}
