//! Foundry configuration stored as TOML (default `foundry.toml`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::critic::CriticRules;
use crate::core::drafter::DrafterOptions;
use crate::core::safety::SafetyRules;
use crate::core::supervisor::SupervisorPolicy;
use crate::io::pacer::PacingConfig;

/// Foundry configuration (TOML).
///
/// Every section is optional; missing fields fall back to the defaults the
/// refinement rules are calibrated against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FoundryConfig {
    pub pacing: PacingConfig,
    pub drafter: DrafterOptions,
    pub safety: SafetyRules,
    pub critic: CriticRules,
    pub supervisor: SupervisorPolicy,
}

impl FoundryConfig {
    pub fn validate(&self) -> Result<()> {
        self.safety.validate()?;
        self.critic.validate()?;
        self.supervisor.validate()?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `FoundryConfig::default()`.
pub fn load_config(path: &Path) -> Result<FoundryConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = FoundryConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FoundryConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &FoundryConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
