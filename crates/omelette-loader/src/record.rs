// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records and their one-shot factories

use crate::error::Result;
use crate::loader::Loader;
use crate::value::{Exports, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Deferred module body, run at most once on first `require()`
pub type Factory = Box<dyn FnOnce(&ModuleContext<'_>) -> Result<()>>;

/// What a factory sees while it runs: `exports`, `module` and `require`.
pub struct ModuleContext<'a> {
    loader: &'a Loader,
    name: &'a str,
    exports: Exports,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(loader: &'a Loader, name: &'a str, exports: Exports) -> Self {
        Self {
            loader,
            name,
            exports,
        }
    }

    /// Key the module was required under
    pub fn name(&self) -> &str {
        self.name
    }

    /// The module's exports handle, initially `{}`
    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    /// Replace the exports wholesale (`module.exports = value`)
    pub fn set_exports(&self, value: Value) {
        *self.exports.borrow_mut() = value;
    }

    /// Assign one export (`exports.key = value`)
    pub fn export(&self, key: impl Into<String>, value: Value) {
        self.exports.borrow_mut().set(key, value);
    }

    /// The loader, for nested `require()` / `register()` calls
    pub fn loader(&self) -> &Loader {
        self.loader
    }

    /// Require another module from inside this factory
    pub fn require(&self, name: &str) -> Result<Exports> {
        self.loader.require(name)
    }
}

/// Resolution state of a record
pub enum ModuleState {
    /// Factory not yet run
    Unresolved(Factory),
    /// Exports materialized (or being populated by a running factory)
    Resolved(Exports),
}

impl fmt::Debug for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleState::Unresolved(_) => write!(f, "Unresolved(<factory>)"),
            ModuleState::Resolved(exports) => match exports.try_borrow() {
                Ok(value) => write!(f, "Resolved({:?})", *value),
                Err(_) => write!(f, "Resolved(<in use>)"),
            },
        }
    }
}

/// One registered unit of code.
///
/// Aliases share the same `Rc<ModuleRecord>`, so resolving under any of them
/// resolves all of them.
#[derive(Debug)]
pub struct ModuleRecord {
    state: RefCell<ModuleState>,
    client: Cell<bool>,
    component: Cell<bool>,
}

impl ModuleRecord {
    /// A record whose exports come from `factory` on first require
    pub fn with_factory(factory: Factory) -> Rc<Self> {
        Rc::new(Self::new(ModuleState::Unresolved(factory)))
    }

    /// A record with exports already present
    pub fn with_exports(value: Value) -> Rc<Self> {
        Rc::new(Self::new(ModuleState::Resolved(Rc::new(RefCell::new(value)))))
    }

    fn new(state: ModuleState) -> Self {
        Self {
            state: RefCell::new(state),
            client: Cell::new(false),
            component: Cell::new(false),
        }
    }

    /// Whether exports are present (factory run, or defined directly)
    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), ModuleState::Resolved(_))
    }

    /// Bundler bookkeeping: set once the factory has run
    pub fn is_client(&self) -> bool {
        self.client.get()
    }

    /// Bundler bookkeeping: set once the factory has run
    pub fn is_component(&self) -> bool {
        self.component.get()
    }

    /// Current exports handle, if resolved
    pub fn exports(&self) -> Option<Exports> {
        match &*self.state.borrow() {
            ModuleState::Resolved(exports) => Some(Rc::clone(exports)),
            ModuleState::Unresolved(_) => None,
        }
    }

    /// Switch to `Resolved({})` and hand back the factory, if it has not run.
    ///
    /// The state borrow is released before the caller runs the factory, so a
    /// re-entrant `require()` of this record sees the partial exports.
    pub(crate) fn begin_resolve(&self) -> Option<(Factory, Exports)> {
        let mut state = self.state.borrow_mut();
        if let ModuleState::Resolved(_) = &*state {
            return None;
        }

        let exports = Rc::new(RefCell::new(Value::empty_object()));
        let previous = std::mem::replace(&mut *state, ModuleState::Resolved(Rc::clone(&exports)));
        self.client.set(true);
        self.component.set(true);

        match previous {
            ModuleState::Unresolved(factory) => Some((factory, exports)),
            ModuleState::Resolved(_) => None,
        }
    }
}
