//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use surge_dashboard::DashboardConfig;
use surge_detector::DetectorConfig;
use surge_oracle::LlmOracleConfig;
use surge_pricing::PricingConfig;
use surge_reconciler::ReconcilerConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SURGE_CONFIG";
/// Config path used when neither `--config` nor `SURGE_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Which oracle prices significant signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Deterministic rules only.
    #[default]
    Rules,
    /// Chat-completions model, with the rules as fallback.
    Llm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub kind: OracleKind,
    #[serde(flatten)]
    pub llm: LlmOracleConfig,
}

/// Decision audit log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Records buffered before a flush.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_persistence_enabled() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/decisions")
}

fn default_buffer_size() -> usize {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
            data_dir: default_data_dir(),
            buffer_size: default_buffer_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info,surge=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level configuration, one section per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from `SURGE_CONFIG` or the default path, falling back to
    /// built-in defaults when the file is absent.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_or_default(&config_path)
    }

    /// Load a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        let sections = [
            ("pricing", self.pricing.validate()),
            ("detector", self.detector.validate()),
            ("reconciler", self.reconciler.validate()),
            ("dashboard", self.dashboard.validate()),
        ];
        for (section, result) in sections {
            result.map_err(|e| AppError::Config(format!("[{section}] {e}")))?;
        }

        if self.oracle.kind == OracleKind::Llm {
            if self.oracle.llm.endpoint.trim().is_empty() {
                return Err(AppError::Config("[oracle] endpoint must be set".to_string()));
            }
            if self.oracle.llm.timeout_ms == 0 {
                return Err(AppError::Config("[oracle] timeout_ms must be > 0".to_string()));
            }
        }

        if self.persistence.enabled && self.persistence.buffer_size == 0 {
            return Err(AppError::Config(
                "[persistence] buffer_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
