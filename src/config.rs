use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cluster::DEFAULT_SEED;
use crate::embeddings::download::{default_model_dir, embedding_files_present, embedding_model_dir};

/// Default port for `doclust serve`.
pub const DEFAULT_PORT: u16 = 5000;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default, so an empty environment is a valid configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory holding downloaded models (DOCLUST_MODEL_DIR)
    pub model_dir: PathBuf,
    /// Seed for k-means initialization (DOCLUST_SEED)
    pub seed: u64,
    /// Address the web server binds to (DOCLUST_BIND)
    pub bind: String,
    /// Port the web server listens on (DOCLUST_PORT)
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("DOCLUST_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        let seed = match env::var("DOCLUST_SEED") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DOCLUST_SEED must be an unsigned integer, got {raw:?}"))?,
            Err(_) => DEFAULT_SEED,
        };

        let port = match env::var("DOCLUST_PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DOCLUST_PORT must be a port number, got {raw:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            model_dir,
            seed,
            bind: env::var("DOCLUST_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
        })
    }

    /// Directory of the sentence embedding model files.
    pub fn embedding_dir(&self) -> PathBuf {
        embedding_model_dir(&self.model_dir)
    }

    /// Check that the embedding model has been downloaded.
    /// Call this before any operation that embeds documents.
    pub fn require_model(&self) -> Result<()> {
        if !embedding_files_present(&self.model_dir) {
            anyhow::bail!(
                "Embedding model files not found in {}\n\
                 Run `doclust download-model` to download them.",
                self.embedding_dir().display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_model_fails_for_empty_dir() {
        let config = Config {
            model_dir: std::env::temp_dir().join("doclust-config-empty"),
            seed: DEFAULT_SEED,
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        };
        let err = config.require_model().unwrap_err();
        assert!(err.to_string().contains("doclust download-model"));
    }

    #[test]
    fn test_embedding_dir_is_model_subdirectory() {
        let config = Config {
            model_dir: PathBuf::from("/srv/models"),
            seed: 7,
            bind: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.embedding_dir(), PathBuf::from("/srv/models/all-MiniLM-L6-v2"));
    }
}
