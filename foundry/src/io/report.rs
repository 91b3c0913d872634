//! JSON audit report of a session.
//!
//! The report is an export only. It is never read back, so sessions still
//! start empty on every run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::core::types::Page;
use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub current_page: Page,
    pub session: &'a Session,
}

impl<'a> SessionReport<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            generated_at: Utc::now(),
            current_page: session.current_page(),
            session,
        }
    }

    /// Pretty-printed JSON with trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = serde_json::to_string_pretty(self).context("serialize session report")?;
        buf.push('\n');
        Ok(buf)
    }
}

/// Write `report` to `path` (temp file + rename).
pub fn write_report(path: &Path, report: &SessionReport<'_>) -> Result<()> {
    debug!(path = %path.display(), iteration = report.session.iteration(), "writing report");
    let buf = report.to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp report {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace report {}", path.display()))?;
    Ok(())
}
