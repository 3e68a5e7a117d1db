//! Configuration management for chathrd
//!
//! TOML-based configuration with defaults and validation.
//! Location: ~/.chathrd/config.toml, or an explicit path.
//!
//! Core components only ever receive a `Config` value; nothing below the
//! binary reads the environment.

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub reranker: RerankerConfig,
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Retrieval fan-out and ranking sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub lexical_top_k: usize,
    pub semantic_top_k: usize,
    pub fusion_top_k: usize,
    pub rrf_constant: u32,
    pub rerank_top_k: usize,
    pub max_subqueries: usize,
    pub max_context_chars: usize,
}

/// Index artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub lexical_path: String,
    pub qdrant_url: String,
    pub collection: String,
}

/// Query embedding model (served by the generation backend)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
}

/// Cross-encoder service; local term-overlap scoring when `url` is unset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    pub url: Option<String>,
    pub model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "hf.co/IlyaGusev/saiga_yandexgpt_8b_gguf:Q4_0".to_string(),
            temperature: 0.8,
            max_tokens: 1000,
            timeout_secs: 240,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_top_k: 5,
            semantic_top_k: 5,
            fusion_top_k: 10,
            rrf_constant: 60,
            rerank_top_k: 5,
            max_subqueries: 3,
            max_context_chars: 12_000,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            lexical_path: "~/.chathrd/data/bm25.json".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "documents".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from ~/.chathrd/config.toml when present, else built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chathrd").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(RagError::ConfigError("llm.model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(RagError::ConfigError(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        let r = &self.retrieval;
        for (name, value) in [
            ("lexical_top_k", r.lexical_top_k),
            ("semantic_top_k", r.semantic_top_k),
            ("fusion_top_k", r.fusion_top_k),
            ("rerank_top_k", r.rerank_top_k),
            ("max_subqueries", r.max_subqueries),
        ] {
            if value == 0 {
                return Err(RagError::ConfigError(format!(
                    "retrieval.{} must be greater than 0",
                    name
                )));
            }
        }

        if r.rrf_constant == 0 {
            return Err(RagError::ConfigError(
                "retrieval.rrf_constant must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RagError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn lexical_index_path(&self) -> PathBuf {
        Self::expand_path(&self.index.lexical_path)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}
