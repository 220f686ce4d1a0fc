/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use crate::error::{OfficeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do when the document records changes or has unaccepted ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeTrackingPolicy {
    /// Fail before touching the document.
    #[default]
    Refuse,
    /// Log a warning and go ahead.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Preferences {
    /// Add "Cited on pages" to resolved bibliography entries as well.
    #[serde(default)]
    pub always_add_cited_on_pages: bool,

    #[serde(default = "default_true")]
    pub sync_when_citing: bool,

    #[serde(default)]
    pub change_tracking: ChangeTrackingPolicy,

    #[serde(default = "default_overlap_report_limit")]
    pub overlap_report_limit: usize,

    #[serde(default)]
    pub report_touching_ranges: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            always_add_cited_on_pages: false,
            sync_when_citing: true,
            change_tracking: ChangeTrackingPolicy::default(),
            overlap_report_limit: default_overlap_report_limit(),
            report_touching_ranges: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_overlap_report_limit() -> usize {
    10
}

impl Preferences {
    /// Loads preferences from a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| OfficeError::Config(format!("{}: {e}", path.display())))?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| OfficeError::Config(format!("{}: {e}", path.display()))),
            "json" => serde_json::from_str(&content)
                .map_err(|e| OfficeError::Config(format!("{}: {e}", path.display()))),
            _ => Err(OfficeError::Config(format!(
                "{}: unsupported preferences format `{ext}`",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let prefs: Preferences = serde_yaml::from_str("always-add-cited-on-pages: true\n").unwrap();
        assert!(prefs.always_add_cited_on_pages);
        assert!(prefs.sync_when_citing);
        assert_eq!(prefs.change_tracking, ChangeTrackingPolicy::Refuse);
        assert_eq!(prefs.overlap_report_limit, 10);
    }

    #[test]
    fn test_json_policy() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"change-tracking": "warn", "overlap-report-limit": 3}"#).unwrap();
        assert_eq!(prefs.change_tracking, ChangeTrackingPolicy::Warn);
        assert_eq!(prefs.overlap_report_limit, 3);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Preferences::from_path(Path::new("Cargo.toml")).unwrap_err();
        assert!(matches!(err, OfficeError::Config(_)));
    }
}
