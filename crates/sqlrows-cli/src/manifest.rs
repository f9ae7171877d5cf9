//! `sqlrows.toml` parsing.
//!
//! ```toml
//! [lint]
//! must-close = "error"
//!
//! [resource]
//! package = "database/sql"
//! type = "Rows"
//! close = ["Close"]
//!
//! [close-check]
//! require-defer = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlrows_engine::analysis::{find_rule, AnalyzerConfig, Severity};
use thiserror::Error;

pub const MANIFEST_NAME: &str = "sqlrows.toml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("unknown rule '{0}' in [lint]")]
    UnknownRule(String),

    #[error("invalid severity for '{rule}': {reason}")]
    InvalidSeverity { rule: String, reason: String },

    #[error("[resource] {0} must not be empty")]
    EmptyField(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Rule name to severity string
    #[serde(default)]
    pub lint: BTreeMap<String, String>,

    #[serde(default)]
    pub resource: ResourceSection,

    #[serde(default, rename = "close-check")]
    pub close_check: CloseCheckSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourceSection {
    pub package: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub close: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CloseCheckSection {
    #[serde(rename = "require-defer")]
    pub require_defer: Option<bool>,
    #[serde(rename = "check-err")]
    pub check_err: Option<bool>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Fold the file's settings into `config`. Keys the file leaves out
    /// keep their current value.
    pub fn apply(&self, config: &mut AnalyzerConfig) -> Result<(), ManifestError> {
        for (name, value) in &self.lint {
            let rule = find_rule(name).ok_or_else(|| ManifestError::UnknownRule(name.clone()))?;
            let severity: Severity = value.parse().map_err(|reason| ManifestError::InvalidSeverity {
                rule: name.clone(),
                reason,
            })?;
            config.set_severity(rule.name, severity);
        }

        let resource = &self.resource;
        if let Some(package) = &resource.package {
            if package.is_empty() {
                return Err(ManifestError::EmptyField("package"));
            }
            config.resource.package = package.clone();
        }
        if let Some(type_name) = &resource.type_name {
            if type_name.is_empty() {
                return Err(ManifestError::EmptyField("type"));
            }
            config.resource.type_name = type_name.clone();
        }
        if let Some(close) = &resource.close {
            if close.is_empty() {
                return Err(ManifestError::EmptyField("close"));
            }
            config.resource.close = close.clone();
        }

        if let Some(on) = self.close_check.require_defer {
            config.close_check.require_defer = on;
        }
        if let Some(on) = self.close_check.check_err {
            config.close_check.check_err = on;
        }
        Ok(())
    }
}

/// Nearest `sqlrows.toml` in `start` or one of its ancestors.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut dir = start.canonicalize().ok()?;
    loop {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_manifest() {
        let manifest = Manifest::from_str(
            r#"
[lint]
must-close = "error"
ordering = "off"

[resource]
package = "github.com/jmoiron/sqlx"
type = "Rows"
close = ["Close", "Release"]

[close-check]
require-defer = true
"#,
        )
        .unwrap();

        let mut config = AnalyzerConfig::new();
        manifest.apply(&mut config).unwrap();
        assert_eq!(config.effective_severity("must-close", Severity::Warn), Severity::Error);
        assert!(config.is_disabled("ordering"));
        assert_eq!(config.resource.package, "github.com/jmoiron/sqlx");
        assert_eq!(config.resource.close, vec!["Close", "Release"]);
        assert!(config.close_check.require_defer);
        assert!(!config.close_check.check_err);
    }

    #[test]
    fn test_empty_manifest_keeps_defaults() {
        let manifest = Manifest::from_str("").unwrap();
        let mut config = AnalyzerConfig::new();
        manifest.apply(&mut config).unwrap();
        assert_eq!(config.resource.package, "database/sql");
        assert_eq!(config.resource.type_name, "Rows");
    }

    #[test]
    fn test_unknown_rule() {
        let manifest = Manifest::from_str("[lint]\nno-such-rule = \"warn\"\n").unwrap();
        let err = manifest.apply(&mut AnalyzerConfig::new()).unwrap_err();
        assert!(matches!(err, ManifestError::UnknownRule(name) if name == "no-such-rule"));
    }

    #[test]
    fn test_bad_severity() {
        let manifest = Manifest::from_str("[lint]\nordering = \"loud\"\n").unwrap();
        let err = manifest.apply(&mut AnalyzerConfig::new()).unwrap_err();
        assert!(err.to_string().contains("unknown severity 'loud'"));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(matches!(
            Manifest::from_str("[package]\nname = \"x\"\n"),
            Err(ManifestError::ParseError(_))
        ));
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), "").unwrap();
        let nested = dir.path().join("src/app");
        std::fs::create_dir_all(&nested).unwrap();
        let found = find_manifest(&nested).unwrap();
        assert_eq!(found, dir.path().canonicalize().unwrap().join(MANIFEST_NAME));
    }
}
