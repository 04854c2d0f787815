use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

// Re-export all submodules
pub mod cache;
pub mod logging;
pub mod registry;
pub mod server;


// Re-export types from submodules for convenience
pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use registry::RegistryConfig;
pub use server::ServerConfig;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let candidate = path.unwrap_or_else(|| PathBuf::from("tinydelivr.toml"));
        let mut config = if candidate.exists() {
            let raw = fs::read_to_string(&candidate)
                .with_context(|| format!("failed to read config {}", candidate.display()))?;
            let mut config: Config = toml::from_str(&raw)
                .with_context(|| format!("invalid config {}", candidate.display()))?;
            config
                .cache
                .normalize_paths(candidate.parent().unwrap_or(Path::new(".")));
            config
        } else {
            if let Some(path) = candidate.to_str() {
                tracing::warn!("configuration file {path} not found, using defaults");
            } else {
                tracing::warn!("configuration file not found, using defaults");
            }
            let mut config = Config::default();
            let cwd = std::env::current_dir().context("reading current directory")?;
            config.cache.normalize_paths(&cwd);
            config
        };
        config.apply_env(std::env::var("REGISTRY").ok())?;
        Ok(config)
    }

    /// `REGISTRY` overrides the configured registry URL; handy for pointing
    /// one-off runs at a mirror without editing the config file.
    pub fn apply_env(&mut self, registry: Option<String>) -> Result<()> {
        if let Some(raw) = registry {
            self.registry.url = raw
                .parse()
                .with_context(|| format!("invalid REGISTRY override {raw:?}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let scheme = self.registry.url.scheme();
        if scheme != "https" && scheme != "http" {
            bail!("unsupported registry scheme {}", self.registry.url);
        }
        if self.server.workers == 0 {
            bail!("server.workers must be at least 1");
        }
        Ok(())
    }
}
