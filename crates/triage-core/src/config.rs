use crate::collect::PytestRunner;
use crate::errors::ConfigError;
use crate::flaky::FlakyPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    pub version: u32,
    #[serde(default)]
    pub runner: PytestRunner,
    #[serde(default = "default_db")]
    pub db: PathBuf,
    #[serde(default)]
    pub flaky: FlakyPolicy,
    #[serde(default)]
    pub external: ExternalConfig,
}

fn default_db() -> PathBuf {
    PathBuf::from(".triage/triage.db")
}

/// Remote reasoning settings. `provider: none` disables the external
/// strategy explicitly; with `openai`, credentials still come from
/// `OPENAI_API_KEY` and their absence is handled by fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.0,
            max_tokens: 800,
        }
    }
}

pub fn load_config(path: &Path) -> Result<TriageConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: TriageConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if cfg.runner.program.trim().is_empty() {
        return Err(ConfigError("runner.program must not be empty".into()));
    }
    if cfg.flaky.window == 0 {
        return Err(ConfigError("flaky.window must be at least 1".into()));
    }
    if !matches!(cfg.external.provider.as_str(), "openai" | "none") {
        return Err(ConfigError(format!(
            "unknown external.provider '{}' (supported: openai, none)",
            cfg.external.provider
        )));
    }
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, include_str!("../../../triage.yaml"))
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses_with_defaults() {
        let cfg: TriageConfig =
            serde_yaml::from_str(include_str!("../../../triage.yaml")).unwrap();
        assert_eq!(cfg.version, SUPPORTED_CONFIG_VERSION);
        assert_eq!(cfg.runner.program, "pytest");
        assert_eq!(cfg.flaky.window, 30);
        assert_eq!(cfg.flaky.min_occurrences, 3);
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg: TriageConfig = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(cfg.db, PathBuf::from(".triage/triage.db"));
        assert_eq!(cfg.external.provider, "openai");
        assert_eq!(cfg.flaky.window, 30);
    }
}
