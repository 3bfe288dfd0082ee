use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::preview::PREVIEW_LIMIT;
use crate::probe::{DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_USER_AGENT};

pub const DEFAULT_CONFIG_FILENAME: &str = "hoardtool.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ToolConfig {
    #[serde(default)]
    pub probe: ProbeSection,
    #[serde(default)]
    pub preview: PreviewSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ProbeSection {
    pub enabled: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PreviewSection {
    pub limit: Option<usize>,
}

impl ToolConfig {
    /// Resolve probing: env HOARDTOOL_PROBE > config > enabled.
    pub fn probe_enabled(&self) -> bool {
        if let Some(value) = env_value("HOARDTOOL_PROBE") {
            return !matches!(
                value.to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        self.probe.enabled.unwrap_or(true)
    }

    /// Resolve probe timeout: env HOARDTOOL_PROBE_TIMEOUT_MS > config > DEFAULT_PROBE_TIMEOUT_MS.
    pub fn probe_timeout(&self) -> Duration {
        let millis = env_value("HOARDTOOL_PROBE_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .or(self.probe.timeout_ms)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    /// Resolve user agent: env HOARDTOOL_USER_AGENT > config > DEFAULT_USER_AGENT.
    pub fn user_agent(&self) -> String {
        env_value("HOARDTOOL_USER_AGENT")
            .or_else(|| self.probe.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn preview_limit(&self) -> usize {
        self.preview.limit.unwrap_or(PREVIEW_LIMIT)
    }
}

/// Load and parse a ToolConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<ToolConfig> {
    if !config_path.exists() {
        return Ok(ToolConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: ToolConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

fn env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
