//! CLI argument definitions for the Quantum Mind server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Environment variable naming the configuration file.
pub const ENV_CONFIG: &str = "QMIND_CONFIG";

/// Quantum Mind - a voice-enabled supportive chat service.
#[derive(Parser, Debug)]
#[command(name = "quantum-mind", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Write a default configuration file to the config path and exit.
    #[arg(long = "init-config")]
    pub init_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > QMIND_CONFIG env var > ~/.quantum-mind/config.toml.
    /// The flag says whether the path was chosen explicitly; an explicit
    /// path must exist and parse.
    pub fn resolve_config_path(&self) -> (PathBuf, bool) {
        self.resolve_config_path_from(std::env::var(ENV_CONFIG).ok())
    }

    fn resolve_config_path_from(&self, env_path: Option<String>) -> (PathBuf, bool) {
        if let Some(ref p) = self.config {
            return (p.clone(), true);
        }
        if let Some(p) = env_path.filter(|p| !p.trim().is_empty()) {
            return (PathBuf::from(p), true);
        }
        (default_config_path(), false)
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".quantum-mind").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".quantum-mind").join("config.toml");
    }
    PathBuf::from("config.toml")
}
