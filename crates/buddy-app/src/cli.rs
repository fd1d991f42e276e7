//! CLI argument definitions for the Travel Buddy server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Travel Buddy: a conversational travel assistant backed by a language
/// model and a place-search provider.
#[derive(Parser, Debug)]
#[command(name = "travel-buddy", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind the API server to.
    #[arg(short = 'b', long = "bind")]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Write a default configuration file to the config path and exit.
    #[arg(long = "init-config")]
    pub init_config: bool,

    /// Print a fresh random API token and exit.
    #[arg(long = "generate-token")]
    pub generate_token: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TRAVEL_BUDDY_CONFIG env var > ~/.travel-buddy/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_from(|key| std::env::var(key).ok())
    }

    fn resolve_config_path_from<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("TRAVEL_BUDDY_CONFIG").filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        match lookup("HOME").or_else(|| lookup("USERPROFILE")) {
            Some(home) => PathBuf::from(home)
                .join(".travel-buddy")
                .join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "travel-buddy",
            "--config",
            "/tmp/tb.toml",
            "-p",
            "8080",
            "--bind",
            "0.0.0.0",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/tb.toml")));
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0"));
        assert!(!args.init_config);
    }

    #[test]
    fn test_config_path_flag_wins() {
        let args = CliArgs::parse_from(["travel-buddy", "-c", "a.toml"]);
        let path = args.resolve_config_path_from(|_| Some("env.toml".to_string()));
        assert_eq!(path, PathBuf::from("a.toml"));
    }

    #[test]
    fn test_config_path_env_then_home() {
        let args = CliArgs::parse_from(["travel-buddy"]);

        let path = args.resolve_config_path_from(|key| match key {
            "TRAVEL_BUDDY_CONFIG" => Some("env.toml".to_string()),
            _ => None,
        });
        assert_eq!(path, PathBuf::from("env.toml"));

        let path = args.resolve_config_path_from(|key| match key {
            "HOME" => Some("/home/ana".to_string()),
            _ => None,
        });
        assert_eq!(path, PathBuf::from("/home/ana/.travel-buddy/config.toml"));

        let path = args.resolve_config_path_from(|_| None);
        assert_eq!(path, PathBuf::from("config.toml"));
    }
}
