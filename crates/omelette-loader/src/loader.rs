// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - registers, aliases and resolves bundle modules

use crate::error::{LoaderError, Result};
use crate::name::CanonicalName;
use crate::record::{ModuleContext, ModuleRecord};
use crate::value::{Exports, Value};
use crate::version::{compare_versions, is_semver_key};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Outcome of [`Loader::resolve_latest`]
#[derive(Debug, Clone)]
pub enum Latest {
    /// The winning registry key (`returnPath` mode)
    Path(String),
    /// The winning module's exports
    Exports(Exports),
}

/// Synchronous, in-memory module registry.
///
/// Owned by whoever boots the bundle and passed by reference to factories.
/// Keys keep registration order; overwriting a key keeps its position.
#[derive(Debug, Default)]
pub struct Loader {
    modules: RefCell<IndexMap<String, Rc<ModuleRecord>>>,
}

impl Loader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazily-instantiated module. Last write wins.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: FnOnce(&ModuleContext<'_>) -> Result<()> + 'static,
    {
        let name = name.into();
        debug!(module = %name, "registering module");
        self.insert_record(name, ModuleRecord::with_factory(Box::new(factory)));
    }

    /// Register a module whose exports are already known
    pub fn define(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        debug!(module = %name, "defining module");
        self.insert_record(name, ModuleRecord::with_exports(value.into()));
    }

    /// Register a factory under a canonical name and every alias derived from it
    pub fn register_package<F>(&self, name: &CanonicalName, factory: F)
    where
        F: FnOnce(&ModuleContext<'_>) -> Result<()> + 'static,
    {
        self.insert_aliases(name, ModuleRecord::with_factory(Box::new(factory)));
    }

    /// Define exports under a canonical name and every alias derived from it
    pub fn define_package(&self, name: &CanonicalName, value: impl Into<Value>) {
        self.insert_aliases(name, ModuleRecord::with_exports(value.into()));
    }

    fn insert_aliases(&self, name: &CanonicalName, record: Rc<ModuleRecord>) {
        debug!(package = %name, "registering package");
        for alias in name.aliases() {
            self.insert_record(alias, Rc::clone(&record));
        }
    }

    /// Point `alias` at the record registered under `target`
    pub fn alias(&self, alias: impl Into<String>, target: &str) -> Result<()> {
        let alias = alias.into();
        let record = self.record(target).ok_or_else(|| LoaderError::AliasTarget {
            alias: alias.clone(),
            target: target.to_string(),
        })?;
        debug!(alias = %alias, target, "aliasing module");
        self.insert_record(alias, record);
        Ok(())
    }

    /// Resolve `name` to its exports, running its factory on first use.
    pub fn require(&self, name: &str) -> Result<Exports> {
        // Clone the handle so no registry borrow is held while the factory runs
        let record = self
            .record(name)
            .ok_or_else(|| LoaderError::module_not_found(name))?;

        match record.begin_resolve() {
            Some((factory, exports)) => {
                debug!(module = name, "instantiating module");
                let context = ModuleContext::new(self, name, Rc::clone(&exports));
                factory(&context)?;
                Ok(exports)
            }
            None => {
                trace!(module = name, "module cache hit");
                record
                    .exports()
                    .ok_or_else(|| LoaderError::module_not_found(name))
            }
        }
    }

    /// Highest version of scoped package `name` (`owner~repo`), required
    pub fn latest(&self, name: &str) -> Result<Exports> {
        let key = self.latest_path(name)?;
        self.require(&key)
    }

    /// Registry key of the highest version of scoped package `name`
    pub fn latest_path(&self, name: &str) -> Result<String> {
        if !name.contains('~') {
            return Err(LoaderError::LatestNotFound(name.to_string()));
        }

        let prefix = format!("{}@", name);
        let mut semver = Vec::new();
        let mut other = Vec::new();
        for key in self.modules.borrow().keys() {
            let Some(version) = key.strip_prefix(&prefix) else {
                continue;
            };
            if is_semver_key(key) {
                semver.push((version.to_string(), key.clone()));
            } else {
                other.push(key.clone());
            }
        }

        if !semver.is_empty() {
            if !other.is_empty() {
                warn!(
                    package = name,
                    ignored = ?other,
                    "ignoring non-semver candidates"
                );
            }
            semver.sort_by(|a, b| compare_versions(&a.0, &b.0));
            if let Some((_, key)) = semver.pop() {
                return Ok(key);
            }
        }

        // More than one branch of the same package makes this pick arbitrary
        other
            .pop()
            .ok_or_else(|| LoaderError::LatestNotFound(name.to_string()))
    }

    /// Single-call form of [`latest`](Self::latest) / [`latest_path`](Self::latest_path)
    pub fn resolve_latest(&self, name: &str, return_path: bool) -> Result<Latest> {
        let key = self.latest_path(name)?;
        if return_path {
            Ok(Latest::Path(key))
        } else {
            self.require(&key).map(Latest::Exports)
        }
    }

    /// Raw record lookup
    pub fn record(&self, name: &str) -> Option<Rc<ModuleRecord>> {
        self.modules.borrow().get(name).cloned()
    }

    /// Raw record insertion. Inserting one record under several keys aliases them.
    pub fn insert_record(&self, name: impl Into<String>, record: Rc<ModuleRecord>) {
        let name = name.into();
        if let Some(previous) = self.modules.borrow_mut().insert(name.clone(), record) {
            if previous.is_resolved() {
                warn!(module = %name, "overwriting a resolved module");
            } else {
                debug!(module = %name, "overwriting module");
            }
        }
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.modules.borrow().contains_key(name)
    }

    /// All registered keys, in registration order
    pub fn modules(&self) -> Vec<String> {
        self.modules.borrow().keys().cloned().collect()
    }

    /// Number of registered keys (aliases counted separately)
    pub fn len(&self) -> usize {
        self.modules.borrow().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.modules.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_factory_runs_once() {
        let loader = Loader::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        loader.register("counter", move |module| {
            counter.set(counter.get() + 1);
            module.export("ready", Value::Boolean(true));
            Ok(())
        });

        let first = loader.require("counter").unwrap();
        let second = loader.require("counter").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(first.borrow().get("ready"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_register_overwrites() {
        let loader = Loader::new();
        loader.define("x", 1);
        loader.define("y", 2);
        loader.define("x", 3);
        assert_eq!(*loader.require("x").unwrap().borrow(), Value::Number(3.0));
        assert_eq!(loader.modules(), vec!["x", "y"]);
    }

    #[test]
    fn test_alias_requires_target() {
        let loader = Loader::new();
        loader.define("component~tip@1.0.0", "tip");
        loader.alias("tip", "component~tip@1.0.0").unwrap();
        assert!(Rc::ptr_eq(
            &loader.require("tip").unwrap(),
            &loader.require("component~tip@1.0.0").unwrap()
        ));
        assert!(matches!(
            loader.alias("missing", "nowhere"),
            Err(LoaderError::AliasTarget { .. })
        ));
    }

    #[test]
    fn test_factory_can_replace_exports() {
        let loader = Loader::new();
        loader.register("answer", |module| {
            module.set_exports(Value::Number(42.0));
            Ok(())
        });
        assert_eq!(*loader.require("answer").unwrap().borrow(), Value::Number(42.0));
    }

    #[test]
    fn test_nested_require() {
        let loader = Loader::new();
        loader.define("emitter", "emitter");
        loader.register("tip", |module| {
            let emitter = module.require("emitter")?;
            module.export("uses", emitter.borrow().clone());
            Ok(())
        });
        let tip = loader.require("tip").unwrap();
        assert_eq!(tip.borrow().get("uses"), Some(&Value::from("emitter")));
    }

    #[test]
    fn test_cycle_sees_partial_exports() {
        let loader = Loader::new();
        loader.register("a", |module| {
            module.export("early", Value::Boolean(true));
            let b = module.require("b")?;
            module.export("b_saw_early", b.borrow().get("a_early").cloned().unwrap_or_default());
            Ok(())
        });
        loader.register("b", |module| {
            let a = module.require("a")?;
            let early = a.borrow().get("early").cloned().unwrap_or_default();
            module.export("a_early", early);
            Ok(())
        });

        let a = loader.require("a").unwrap();
        assert_eq!(a.borrow().get("b_saw_early"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_failing_factory_does_not_rerun() {
        let loader = Loader::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        loader.register("broken", move |module| {
            counter.set(counter.get() + 1);
            module.export("partial", Value::Null);
            Err(LoaderError::definition(module.name(), "boom"))
        });

        let err = loader.require("broken").unwrap_err();
        assert!(err.to_string().contains("boom"));
        let partial = loader.require("broken").unwrap();
        assert_eq!(partial.borrow().get("partial"), Some(&Value::Null));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_latest_requires_scope() {
        let loader = Loader::new();
        loader.define("jquery@1.11.1", "$");
        assert!(matches!(
            loader.latest_path("jquery"),
            Err(LoaderError::LatestNotFound(_))
        ));
    }

    #[test]
    fn test_latest_prefers_semver_over_branches() {
        let loader = Loader::new();
        loader.define("pkg~repo@master", "branch");
        loader.define("pkg~repo@0.1.0", "old");
        loader.define("pkg~repo@0.2.0", "new");
        loader.define("pkg~repository@9.9.9", "other package");
        assert_eq!(loader.latest_path("pkg~repo").unwrap(), "pkg~repo@0.2.0");
    }

    #[test]
    fn test_latest_last_registered_branch_wins() {
        let loader = Loader::new();
        loader.define("pkg~repo@develop", "develop");
        loader.define("pkg~repo@master", "master");
        assert_eq!(loader.latest_path("pkg~repo").unwrap(), "pkg~repo@master");
    }

    #[test]
    fn test_resolve_latest_modes() {
        let loader = Loader::new();
        loader.define("pkg~repo@1.0.0", "one");
        assert!(matches!(
            loader.resolve_latest("pkg~repo", true).unwrap(),
            Latest::Path(key) if key == "pkg~repo@1.0.0"
        ));
        match loader.resolve_latest("pkg~repo", false).unwrap() {
            Latest::Exports(exports) => assert_eq!(*exports.borrow(), Value::from("one")),
            Latest::Path(_) => panic!("expected exports"),
        }
    }

    #[test]
    fn test_package_aliases_share_record() {
        let loader = Loader::new();
        let name = CanonicalName::parse("component~favicon@1.0.3").unwrap();
        loader.register_package(&name, |module| {
            module.export("set", Value::Boolean(true));
            Ok(())
        });
        assert_eq!(loader.len(), 4);
        let canonical = loader.require("component~favicon@1.0.3").unwrap();
        for alias in ["component-favicon", "component~favicon", "favicon"] {
            assert!(Rc::ptr_eq(&canonical, &loader.require(alias).unwrap()));
        }
        assert!(loader.record("favicon").unwrap().is_client());
    }
}
