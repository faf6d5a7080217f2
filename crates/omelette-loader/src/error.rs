// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while registering or resolving modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// `require()` of a name that was never registered
    #[error("failed to require \"{0}\"")]
    ModuleNotFound(String),

    /// `latest()` found no `<name>@<version>` candidate, or the name is not scoped
    #[error("failed to find latest module of \"{0}\"")]
    LatestNotFound(String),

    /// Canonical module name could not be parsed
    #[error("invalid module name \"{name}\": {reason}")]
    InvalidName {
        /// The offending name
        name: String,
        /// Reason for failure
        reason: String,
    },

    /// A module factory reported failure
    #[error("error defining module \"{module}\": {reason}")]
    Definition {
        /// Module whose factory failed
        module: String,
        /// Reason for failure
        reason: String,
    },

    /// Alias pointing at a key that is not registered
    #[error("cannot alias \"{alias}\" to unknown module \"{target}\"")]
    AliasTarget {
        /// Alias being created
        alias: String,
        /// Missing target key
        target: String,
    },

    /// Manifest is well-formed TOML but describes an impossible bundle
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest parsing error
    #[error("Manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoaderError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a factory failure for `module`
    pub fn definition(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Definition {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
