// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # omelette-loader
//!
//! The CommonJS-style module system that wires the omelette bundle together.
//!
//! - `register()` a factory, run lazily and at most once
//! - `define()` exports directly (templates and other assets)
//! - `require()` by name or alias, failing fast on unknown names
//! - `latest()` resolves the highest version of a `owner~repo` package
//!
//! ## Quick Start
//!
//! ```rust
//! use omelette_loader::{Loader, Value};
//!
//! let loader = Loader::new();
//! loader.define("pkg~repo@1.2.0", "old");
//! loader.define("pkg~repo@1.10.0", "new");
//! loader.register("app", |module| {
//!     let dep = module.require("pkg~repo@1.10.0")?;
//!     module.export("dep", dep.borrow().clone());
//!     Ok(())
//! });
//!
//! assert_eq!(loader.latest_path("pkg~repo").unwrap(), "pkg~repo@1.10.0");
//! let app = loader.require("app").unwrap();
//! assert_eq!(app.borrow().get("dep"), Some(&Value::from("new")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod name;
pub mod record;
pub mod value;
pub mod version;

// Re-exports
pub use bundle::Bundle;
pub use error::{LoaderError, Result};
pub use loader::{Latest, Loader};
pub use manifest::Manifest;
pub use name::CanonicalName;
pub use record::{Factory, ModuleContext, ModuleRecord, ModuleState};
pub use value::{Exports, NativeFunction, Value};
pub use version::compare_versions;

/// Version of the loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
