use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Advisory only: crossing it logs a warning, nothing is evicted.
    #[serde(default = "default_size_threshold")]
    pub size_threshold_bytes: u64,
}

impl CacheConfig {
    pub fn normalize_paths(&mut self, base_dir: &Path) {
        if self.dir.is_relative() {
            self.dir = base_dir.join(&self.dir);
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            size_threshold_bytes: default_size_threshold(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./delivr_cache")
}

fn default_size_threshold() -> u64 {
    1024 * 1024
}
