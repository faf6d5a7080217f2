// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundle manifest (`omelette.toml`)
//!
//! ```toml
//! entry = "omelette"
//!
//! [[package]]
//! name = "component~domready@0.1.0"
//! exports = { ready = true }
//!
//! [[define]]
//! name = "omelette/template.html"
//! template = "template.html"
//!
//! [aliases]
//! "ready" = "component~domready@0.1.0"
//! ```

use crate::error::{LoaderError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default manifest file name
pub const MANIFEST_FILE: &str = "omelette.toml";

/// Environment variable overriding the entry module
pub const ENTRY_ENV: &str = "OMELETTE_ENTRY";

/// Module required when the bundle boots
pub const DEFAULT_ENTRY: &str = "omelette";

/// Declarative description of a bundle's modules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Module required by [`Bundle::boot`](crate::Bundle::boot)
    pub entry: String,

    /// Versioned packages, registered under their derived aliases
    #[serde(rename = "package")]
    pub packages: Vec<PackageEntry>,

    /// Plain defined modules
    #[serde(rename = "define")]
    pub defines: Vec<DefineEntry>,

    /// Extra alias -> target keys
    pub aliases: BTreeMap<String, String>,
}

/// A `[[package]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
    /// Canonical `owner~repo@version` name
    pub name: String,
    /// Exports; `{}` when omitted
    pub exports: Option<toml::Value>,
}

/// A `[[define]]` table. Exactly one of `value` / `template` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefineEntry {
    /// Registry key
    pub name: String,
    /// Inline exports
    pub value: Option<toml::Value>,
    /// File whose contents become a string export, relative to the manifest
    pub template: Option<PathBuf>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            entry: DEFAULT_ENTRY.to_string(),
            packages: Vec::new(),
            defines: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Load a manifest file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading manifest");
        let content = std::fs::read_to_string(path)?;
        let mut manifest = Self::from_toml_str(&content)?;
        manifest.apply_env_from(|key| std::env::var(key).ok());
        Ok(manifest)
    }

    /// Parse manifest text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Apply `OMELETTE_ENTRY` using the given variable lookup
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(entry) = lookup(ENTRY_ENV).filter(|e| !e.trim().is_empty()) {
            debug!(entry = %entry, "entry module overridden from environment");
            self.entry = entry;
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.entry.trim().is_empty() {
            return Err(LoaderError::Manifest("entry must not be empty".into()));
        }
        for define in &self.defines {
            match (&define.value, &define.template) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(LoaderError::Manifest(format!(
                        "define \"{}\" needs exactly one of `value` or `template`",
                        define.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_defaults() {
        let manifest = Manifest::from_toml_str("").unwrap();
        assert_eq!(manifest.entry, DEFAULT_ENTRY);
        assert!(manifest.packages.is_empty());
        assert!(manifest.defines.is_empty());
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::from_toml_str(
            r#"
entry = "app"

[[package]]
name = "component~domready@0.1.0"
exports = { ready = true }

[[package]]
name = "component~jquery@1.11.1"

[[define]]
name = "app/template.html"
template = "template.html"

[[define]]
name = "app/config"
value = { debug = false }

[aliases]
"ready" = "component~domready@0.1.0"
"#,
        )
        .unwrap();

        assert_eq!(manifest.entry, "app");
        assert_eq!(manifest.packages.len(), 2);
        assert!(manifest.packages[1].exports.is_none());
        assert_eq!(manifest.defines[0].template, Some(PathBuf::from("template.html")));
        assert_eq!(manifest.aliases["ready"], "component~domready@0.1.0");
    }

    #[test]
    fn test_define_needs_one_source() {
        let err = Manifest::from_toml_str("[[define]]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, LoaderError::Manifest(_)));

        let err = Manifest::from_toml_str(
            "[[define]]\nname = \"x\"\nvalue = 1\ntemplate = \"x.html\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, LoaderError::Manifest(_)));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = Manifest::from_toml_str("entyr = \"typo\"").unwrap_err();
        assert!(matches!(err, LoaderError::Toml(_)));
    }

    #[test]
    fn test_env_override() {
        let mut manifest = Manifest::default();
        manifest.apply_env_from(|key| (key == ENTRY_ENV).then(|| "debug".to_string()));
        assert_eq!(manifest.entry, "debug");

        manifest.apply_env_from(|_| Some("  ".to_string()));
        assert_eq!(manifest.entry, "debug");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "[[package]]\nname = \"component~tip@2.0.0\"\n").unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.packages[0].name, "component~tip@2.0.0");
    }
}
