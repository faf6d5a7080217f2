// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Canonical bundle module names (`owner~repo@version`)

use crate::error::{LoaderError, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed `owner~repo@version` module name.
///
/// Aliases are derived from the parsed parts instead of being written out by
/// hand for every package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalName {
    /// Package owner (`component` in `component~domready@0.1.0`)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Version or branch string
    pub version: String,
}

impl CanonicalName {
    /// Parse a canonical name
    pub fn parse(name: &str) -> Result<Self> {
        let (scoped, version) = name
            .split_once('@')
            .ok_or_else(|| LoaderError::invalid_name(name, "missing '@<version>'"))?;
        let (owner, repo) = scoped
            .split_once('~')
            .ok_or_else(|| LoaderError::invalid_name(name, "missing '<owner>~' scope"))?;

        if owner.is_empty() || repo.is_empty() || version.is_empty() {
            return Err(LoaderError::invalid_name(name, "empty owner, repo or version"));
        }
        if repo.contains('~') || version.contains('@') {
            return Err(LoaderError::invalid_name(name, "unexpected '~' or '@'"));
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            version: version.to_string(),
        })
    }

    /// The `owner~repo` base used by `latest()`
    pub fn scoped(&self) -> String {
        format!("{}~{}", self.owner, self.repo)
    }

    /// Every key the record is registered under, canonical name first
    pub fn aliases(&self) -> Vec<String> {
        vec![
            self.to_string(),
            format!("{}-{}", self.owner, self.repo),
            self.scoped(),
            self.repo.clone(),
        ]
    }
}

impl FromStr for CanonicalName {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}@{}", self.owner, self.repo, self.version)
    }
}
