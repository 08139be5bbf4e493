use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub search: SearchDefaults,
    pub flush: FlushConfig,
}

/// Values a simple-shape search falls back to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub default_topk: i64,
    pub default_metric_type: String,
    pub default_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    pub poll_interval_ms: u64,
}

impl FlushConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            search: SearchDefaults::default(),
            flush: FlushConfig::default(),
        }
    }
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_topk: 100,
            default_metric_type: "L2".to_string(),
            default_offset: 0,
        }
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl CodecConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.default_topk <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.default_topk".to_string(),
                value: self.search.default_topk.to_string(),
            });
        }
        if self.search.default_offset < 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.default_offset".to_string(),
                value: self.search.default_offset.to_string(),
            });
        }
        if self.search.default_metric_type.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "search.default_metric_type".to_string(),
                value: self.search.default_metric_type.clone(),
            });
        }
        if self.flush.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "flush.poll_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
