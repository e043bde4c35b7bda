use anyhow::{Context as AnyhowContext, Result};
use evidence_protocol::{DensityConfig, SemanticConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// TOML configuration for the `evidence-graph` binary. Every section is
/// optional; a missing collaborator section simply disables its stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub concepts: Option<EndpointConfig>,
    pub embeddings: Option<EmbeddingEndpointConfig>,
    pub density: DensityConfig,
    pub semantic: SemanticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingEndpointConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub batch_size: usize,
}

impl Default for EmbeddingEndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: 10_000,
            batch_size: 32,
        }
    }
}

/// Load the config file, or defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
