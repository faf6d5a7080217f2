// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundle bootstrap: populate a loader from a manifest and require the entry

use crate::error::{LoaderError, Result};
use crate::loader::Loader;
use crate::manifest::{MANIFEST_FILE, Manifest};
use crate::name::CanonicalName;
use crate::value::{Exports, Value};
use std::path::Path;
use tracing::{debug, info};

/// A populated loader plus the module to boot.
#[derive(Debug)]
pub struct Bundle {
    loader: Loader,
    entry: String,
}

impl Bundle {
    /// A bundle holding only the application stub
    pub fn new(entry: impl Into<String>) -> Self {
        let bundle = Self {
            loader: Loader::new(),
            entry: entry.into(),
        };
        bundle.install_entry_stub();
        bundle
    }

    /// Build a bundle from a manifest. Template paths resolve against `base_dir`.
    ///
    /// Packages are registered first, then defines, then aliases, so alias
    /// targets may name any package alias or define.
    pub fn from_manifest(manifest: &Manifest, base_dir: &Path) -> Result<Self> {
        manifest.validate()?;
        let loader = Loader::new();

        for package in &manifest.packages {
            let name = CanonicalName::parse(&package.name)?;
            let exports = package
                .exports
                .clone()
                .map(Value::from)
                .unwrap_or_else(Value::empty_object);
            loader.define_package(&name, exports);
        }

        for define in &manifest.defines {
            let value = match (&define.value, &define.template) {
                (Some(value), None) => Value::from(value.clone()),
                (None, Some(template)) => {
                    let path = base_dir.join(template);
                    debug!(path = %path.display(), module = %define.name, "reading template");
                    Value::String(std::fs::read_to_string(&path)?)
                }
                _ => {
                    return Err(LoaderError::Manifest(format!(
                        "define \"{}\" needs exactly one of `value` or `template`",
                        define.name
                    )));
                }
            };
            loader.define(define.name.clone(), value);
        }

        for (alias, target) in &manifest.aliases {
            loader.alias(alias.clone(), target)?;
        }

        let bundle = Self {
            loader,
            entry: manifest.entry.clone(),
        };
        bundle.install_entry_stub();
        info!(
            modules = bundle.loader.len(),
            entry = %bundle.entry,
            "bundle loaded"
        );
        Ok(bundle)
    }

    /// Load `path`, or fall back to a stub-only bundle when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no manifest, using empty bundle");
            let mut manifest = Manifest::default();
            manifest.apply_env_from(|key| std::env::var(key).ok());
            return Ok(Self::new(manifest.entry));
        }
        Self::load(path)
    }

    /// Load an explicitly named manifest, or `omelette.toml` when none is given.
    ///
    /// Only the implicit default falls back to a stub-only bundle.
    pub fn open(manifest: Option<&Path>) -> Result<Self> {
        match manifest {
            Some(path) => Self::load(path),
            None => Self::load_or_default(Path::new(MANIFEST_FILE)),
        }
    }

    /// Load the manifest at `path`. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let manifest = Manifest::load(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::from_manifest(&manifest, base_dir)
    }

    /// The application module carries no logic: an empty factory.
    fn install_entry_stub(&self) {
        if !self.loader.contains(&self.entry) {
            self.loader.register(self.entry.clone(), |_| Ok(()));
        }
    }

    /// Require the entry module
    pub fn boot(&self) -> Result<Exports> {
        info!(entry = %self.entry, "booting bundle");
        self.loader.require(&self.entry)
    }

    /// The bundle's loader
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Entry module name
    pub fn entry(&self) -> &str {
        &self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DefineEntry;

    #[test]
    fn test_stub_boots_to_empty_object() {
        let bundle = Bundle::new("omelette");
        let exports = bundle.boot().unwrap();
        assert_eq!(*exports.borrow(), Value::empty_object());
        assert!(bundle.loader().record("omelette").unwrap().is_client());
    }

    #[test]
    fn test_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tip.html"), "<div class=\"tip\"></div>").unwrap();
        let manifest = Manifest::from_toml_str(
            r#"
[[package]]
name = "component~domready@0.1.0"
exports = { ready = true }

[[define]]
name = "tip/template.html"
template = "tip.html"

[aliases]
"dom-ready" = "domready"
"#,
        )
        .unwrap();

        let bundle = Bundle::from_manifest(&manifest, dir.path()).unwrap();
        let loader = bundle.loader();
        assert_eq!(
            *loader.require("tip/template.html").unwrap().borrow(),
            Value::from("<div class=\"tip\"></div>")
        );
        assert_eq!(
            loader.require("dom-ready").unwrap().borrow().get("ready"),
            Some(&Value::Boolean(true))
        );
        assert_eq!(loader.latest_path("component~domready").unwrap(), "component~domready@0.1.0");
        assert!(bundle.boot().is_ok());
    }

    #[test]
    fn test_entry_defined_by_manifest_is_kept() {
        let manifest = Manifest::from_toml_str(
            "[[define]]\nname = \"omelette\"\nvalue = \"payload\"\n",
        )
        .unwrap();
        let bundle = Bundle::from_manifest(&manifest, Path::new(".")).unwrap();
        assert_eq!(*bundle.boot().unwrap().borrow(), Value::from("payload"));
    }

    #[test]
    fn test_bad_alias_fails() {
        let manifest = Manifest::from_toml_str("[aliases]\n\"x\" = \"missing\"\n").unwrap();
        let err = Bundle::from_manifest(&manifest, Path::new(".")).unwrap_err();
        assert!(matches!(err, LoaderError::AliasTarget { .. }));
    }

    #[test]
    fn test_bad_package_name_fails() {
        let manifest = Manifest::from_toml_str("[[package]]\nname = \"jquery\"\n").unwrap();
        let err = Bundle::from_manifest(&manifest, Path::new(".")).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidName { .. }));
    }

    #[test]
    fn test_explicit_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Bundle::load(&dir.path().join("typo.toml")).unwrap_err();
        assert!(matches!(err, LoaderError::Io(_)));
    }

    #[test]
    fn test_open_named_manifest_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let err = Bundle::open(Some(dir.path().join("omelete.toml").as_path())).unwrap_err();
        assert!(matches!(err, LoaderError::Io(_)));
    }

    #[test]
    fn test_built_manifest_is_validated() {
        let mut manifest = Manifest::default();
        manifest.defines.push(DefineEntry {
            name: "tip/template.html".into(),
            value: Some(toml::Value::String("inline".into())),
            template: Some("tip.html".into()),
        });
        let err = Bundle::from_manifest(&manifest, Path::new(".")).unwrap_err();
        assert!(matches!(err, LoaderError::Manifest(_)));

        manifest.defines[0].value = None;
        manifest.defines[0].template = None;
        let err = Bundle::from_manifest(&manifest, Path::new(".")).unwrap_err();
        assert!(matches!(err, LoaderError::Manifest(_)));
    }

    #[test]
    fn test_missing_manifest_is_stub_only() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::load_or_default(&dir.path().join("omelette.toml")).unwrap();
        assert_eq!(bundle.loader().len(), 1);
    }
}
