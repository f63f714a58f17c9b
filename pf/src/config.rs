//! Planforge configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::validator::ValidatorConfig;

/// Main planforge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reasoner endpoint configuration
    pub reasoner: ReasonerConfig,

    /// Research endpoint configuration
    pub research: ResearchConfig,

    /// Confidence gates
    pub gates: GatesConfig,

    /// Structural validation tolerances
    pub validator: ValidatorConfig,

    /// Enrichment task retention
    pub tasks: TasksConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set. Call this early
    /// in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.reasoner.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Reasoner API key not found. Set the {} environment variable.",
                self.reasoner.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planforge.yml
        let local_config = PathBuf::from(".planforge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planforge/planforge.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planforge").join("planforge.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Reasoner endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Model identifier passed through to the endpoint
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            model: "reasoner-large".to_string(),
            api_key_env: "PLANFORGE_API_KEY".to_string(),
            base_url: "https://api.planforge.dev".to_string(),
            max_tokens: 8192,
            timeout_ms: 300_000,
        }
    }
}

/// Research endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "PLANFORGE_RESEARCH_KEY".to_string(),
            base_url: "https://research.planforge.dev".to_string(),
            timeout_ms: 600_000,
        }
    }
}

/// Confidence gates for pipeline progression
///
/// Intake and review share the strict G1/G2 threshold; the generation gate
/// is intentionally lower: "good enough for the deterministic corrector",
/// not "perfect".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatesConfig {
    /// G1: intake/clarify gate (0-100)
    pub intake: f64,

    /// G2: internal review gate (0-100)
    pub review: f64,

    /// G3: generation gate (0-100), overridable per deployment
    pub generate: f64,

    /// Total round cap across the Clarify/InternalReview cycle
    #[serde(rename = "max-rounds")]
    pub max_rounds: usize,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            intake: 95.0,
            review: 95.0,
            generate: 90.0,
            max_rounds: 8,
        }
    }
}

/// Enrichment task retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Seconds a terminal task is retained before the GC sweep evicts it
    #[serde(rename = "retention-secs")]
    pub retention_secs: u64,

    /// Seconds between GC sweeps
    #[serde(rename = "gc-interval-secs")]
    pub gc_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
            gc_interval_secs: 60,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the plan store
    #[serde(rename = "store-dir")]
    pub store_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/planforge on Linux)
        let store_dir = dirs::data_dir()
            .map(|d| d.join("planforge"))
            .unwrap_or_else(|| PathBuf::from(".planstore"));

        Self { store_dir }
    }
}
